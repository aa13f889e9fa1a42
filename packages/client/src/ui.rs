//! UI utilities for the client.

use std::io::Write;

/// Print server output and redisplay the prompt
pub fn print_and_prompt(text: &str, nickname: &str) {
    print!("\n{text}\n");
    redisplay_prompt(nickname);
}

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(nickname: &str) {
    print!("{nickname}> ");
    std::io::stdout().flush().ok();
}
