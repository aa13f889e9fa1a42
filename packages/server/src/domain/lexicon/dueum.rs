//! 頭音法則（두음법칙）による語頭の同一視
//!
//! 語頭の ㄹ は ㄴ（ㅑ ㅕ ㅖ ㅛ ㅠ ㅣ の前では ㅇ）として、語頭の ㄴ は同じ母音の前で
//! ㅇ として読みます。表の組を union-find で同値類にまとめるので、
//! `equivalents(c)` は 1 回のマップ参照で済み、関係は対称かつ推移的です。

use std::{borrow::Cow, collections::HashMap};

use super::hangul::{
    self, FINAL_COUNT, INITIAL_IEUNG, INITIAL_NIEUN, INITIAL_RIEUL, MEDIAL_COUNT,
    PALATAL_MEDIALS, Syllable,
};

/// Precomputed equivalence classes over Hangul syllables
#[derive(Debug, Clone, Default)]
pub struct InitialSoundTable {
    class_of: HashMap<char, usize>,
    classes: Vec<Vec<char>>,
}

impl InitialSoundTable {
    /// Table derived from the standard dueum rule over every medial and final.
    pub fn standard() -> Self {
        Self::from_pairs(standard_pairs())
    }

    /// Build the reflexive-symmetric-transitive closure of `pairs`.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (char, char)>) -> Self {
        let mut index: HashMap<char, usize> = HashMap::new();
        let mut members: Vec<char> = Vec::new();
        let mut forest = UnionFind::default();

        let mut slot = |c: char, forest: &mut UnionFind| -> usize {
            *index.entry(c).or_insert_with(|| {
                members.push(c);
                forest.push()
            })
        };

        for (a, b) in pairs {
            if a == b {
                continue;
            }
            let ia = slot(a, &mut forest);
            let ib = slot(b, &mut forest);
            forest.union(ia, ib);
        }

        let mut root_to_class: HashMap<usize, usize> = HashMap::new();
        let mut classes: Vec<Vec<char>> = Vec::new();
        let mut class_of = HashMap::with_capacity(members.len());
        for (i, c) in members.iter().enumerate() {
            let root = forest.find(i);
            let class = *root_to_class.entry(root).or_insert_with(|| {
                classes.push(Vec::new());
                classes.len() - 1
            });
            classes[class].push(*c);
            class_of.insert(*c, class);
        }
        for class in &mut classes {
            class.sort_unstable();
        }

        Self { class_of, classes }
    }

    /// Every syllable equivalent to `c`, always including `c` itself.
    pub fn equivalents(&self, c: char) -> Cow<'_, [char]> {
        match self.class_of.get(&c) {
            Some(&class) => Cow::Borrowed(&self.classes[class]),
            None => Cow::Owned(vec![c]),
        }
    }

    pub fn are_equivalent(&self, a: char, b: char) -> bool {
        if a == b {
            return true;
        }
        match (self.class_of.get(&a), self.class_of.get(&b)) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Number of syllables that belong to a non-trivial class
    pub fn len(&self) -> usize {
        self.class_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.class_of.is_empty()
    }
}

fn standard_pairs() -> Vec<(char, char)> {
    let mut pairs = Vec::new();
    for medial in 0..MEDIAL_COUNT {
        let palatal = PALATAL_MEDIALS.contains(&medial);
        for final_ in 0..FINAL_COUNT {
            let at = |initial| hangul::compose(Syllable { initial, medial, final_ });

            let rieul_target = if palatal { INITIAL_IEUNG } else { INITIAL_NIEUN };
            if let (Some(from), Some(to)) = (at(INITIAL_RIEUL), at(rieul_target)) {
                pairs.push((from, to));
            }
            if palatal && let (Some(from), Some(to)) = (at(INITIAL_NIEUN), at(INITIAL_IEUNG)) {
                pairs.push((from, to));
            }
        }
    }
    pairs
}

#[derive(Debug, Default)]
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn push(&mut self) -> usize {
        let id = self.parent.len();
        self.parent.push(id);
        self.rank.push(0);
        id
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}
