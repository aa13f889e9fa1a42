//! WebSocket client session management.

use futures_util::{Sink, SinkExt, StreamExt};
use kkutu_shared::time::get_timestamp_millis;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

use super::{
    command::{Command, HELP_TEXT, parse_input},
    domain::{close_code_to_error, websocket_url},
    error::ClientError,
    formatter::{IncomingFrame, MessageFormatter},
    login::login,
    runner::ClientOptions,
    ui::{print_and_prompt, redisplay_prompt},
};

/// Run one WebSocket session. Returns `Ok` when the user quits.
pub async fn run_client_session(
    http: &reqwest::Client,
    options: &ClientOptions,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<(), ClientError> {
    let session = login(http, &options.server, &options.nickname).await?;
    tracing::debug!(user_id = session.user_id, "Logged in");

    let url = websocket_url(&options.server, options.room_id, &session.token);
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    tracing::info!("Connected to kkutu server!");
    println!(
        "\nYou are '{}'. Type a word and press Enter to play, /help for commands.\n",
        session.nickname
    );

    let (mut write, mut read) = ws_stream.split();

    let nickname = session.nickname.clone();
    let room_id = options.room_id;

    // Spawn a task to handle incoming messages
    let mut read_task = tokio::spawn(async move {
        let mut formatter = MessageFormatter::new();

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let rendered = match IncomingFrame::parse(text.as_str()) {
                        Some(frame) => formatter.format(&frame),
                        None => Some(text.to_string()),
                    };
                    if let Some(rendered) = rendered {
                        print_and_prompt(&rendered, &nickname);
                    }
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!("Server closed the connection");
                    return Err(match frame {
                        Some(frame) => close_code_to_error(
                            u16::from(frame.code),
                            frame.reason.as_str(),
                            &nickname,
                            room_id,
                        ),
                        None => ClientError::ConnectionError("closed by server".to_string()),
                    });
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
                _ => {}
            }
        }

        Err(ClientError::ConnectionError("Connection lost".to_string()))
    });

    tokio::select! {
        read_result = &mut read_task => {
            read_result.unwrap_or_else(|e| Err(ClientError::ConnectionError(e.to_string())))
        }
        write_result = write_loop(&mut write, input_rx, &session.nickname) => {
            read_task.abort();
            write_result
        }
    }
}

/// Forward input lines to the server until the user quits
async fn write_loop<S>(
    write: &mut S,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
    nickname: &str,
) -> Result<(), ClientError>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    let mut request_id: u64 = 0;

    while let Some(line) = input_rx.recv().await {
        let message = match parse_input(&line, get_timestamp_millis()) {
            Ok(Command::Send(message)) => message,
            Ok(Command::Help) => {
                print_and_prompt(HELP_TEXT, nickname);
                continue;
            }
            Ok(Command::Quit) => break,
            Err(e) => {
                print_and_prompt(&e.to_string(), nickname);
                continue;
            }
        };

        request_id += 1;
        let json = match message.to_json(request_id) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize message: {}", e);
                continue;
            }
        };

        if let Err(e) = write.send(Message::Text(json.into())).await {
            tracing::warn!("Failed to send message: {}", e);
            return Err(ClientError::ConnectionError(e.to_string()));
        }
        redisplay_prompt(nickname);
    }

    write.send(Message::Close(None)).await.ok();
    Ok(())
}
