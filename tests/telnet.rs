//! End-to-end tests over real TCP connections

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use room_chat_server::{serve, Config};

const WAIT: Duration = Duration::from_secs(5);
const QUIET: Duration = Duration::from_millis(200);

async fn start_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Config::default()));
    addr
}

struct Client {
    stream: TcpStream,
    seen: String,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let mut client = Self {
            stream,
            seen: String::new(),
        };
        client.expect("> ").await;
        client
    }

    async fn line(&mut self, text: &str) {
        self.stream
            .write_all(format!("{text}\r\n").as_bytes())
            .await
            .unwrap();
    }

    /// Read until `needle` shows up, consuming everything up to and including it
    async fn expect(&mut self, needle: &str) -> String {
        let result = timeout(WAIT, async {
            loop {
                if let Some(pos) = self.seen.find(needle) {
                    let head: String = self.seen.drain(..pos + needle.len()).collect();
                    return head;
                }
                let mut buf = [0u8; 1024];
                let n = self.stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed while waiting for {needle:?}");
                self.seen.push_str(&String::from_utf8_lossy(&buf[..n]));
            }
        })
        .await;
        result.unwrap_or_else(|_| panic!("timed out waiting for {needle:?}, saw {:?}", self.seen))
    }

    /// Assert nothing arrives for a short while
    async fn expect_silence(&mut self) {
        let mut buf = [0u8; 1024];
        match timeout(QUIET, self.stream.read(&mut buf)).await {
            Err(_) => {}
            Ok(Ok(n)) => panic!(
                "unexpected data: {:?}",
                String::from_utf8_lossy(&buf[..n])
            ),
            Ok(Err(e)) => panic!("read error: {e}"),
        }
        assert!(self.seen.is_empty(), "unexpected data: {:?}", self.seen);
    }

    async fn command(&mut self, text: &str) -> String {
        self.line(text).await;
        self.expect("> ").await
    }
}

#[tokio::test]
async fn test_join_confirms_with_crlf() {
    let addr = start_server().await;
    let mut x = Client::connect(addr).await;

    let reply = x.command("join lobby").await;

    assert_eq!(reply, "Joined room lobby\r\n> ");
}

#[tokio::test]
async fn test_message_reaches_others_not_sender() {
    let addr = start_server().await;
    let mut x = Client::connect(addr).await;
    let mut y = Client::connect(addr).await;
    x.command("join lobby").await;
    y.command("join lobby").await;

    assert_eq!(x.command("send hi there").await, "> ");

    assert_eq!(y.expect("\r\n").await, "hi there\r\n");
    x.expect_silence().await;
}

#[tokio::test]
async fn test_left_session_neither_sends_nor_receives() {
    let addr = start_server().await;
    let mut x = Client::connect(addr).await;
    let mut y = Client::connect(addr).await;
    x.command("join lobby").await;
    y.command("join lobby").await;

    assert_eq!(x.command("leave").await, "Left room lobby\r\n> ");
    assert_eq!(
        x.command("send hi").await,
        "You are not in a room\r\n> "
    );
    y.expect_silence().await;

    y.command("send still here?").await;
    x.expect_silence().await;

    assert_eq!(x.command("leave").await, "You are not in any room\r\n> ");
}

#[tokio::test]
async fn test_switching_rooms_stops_old_traffic() {
    let addr = start_server().await;
    let mut z = Client::connect(addr).await;
    let mut y = Client::connect(addr).await;
    z.command("join lobby").await;
    y.command("join lobby").await;

    assert_eq!(
        z.command("join office").await,
        "Left room lobby\r\nJoined room office\r\n> "
    );

    y.command("send lobby chatter").await;
    z.expect_silence().await;
}

#[tokio::test]
async fn test_disconnect_without_leave_is_cleaned_up() {
    let addr = start_server().await;
    let mut w = Client::connect(addr).await;
    let mut y = Client::connect(addr).await;
    let mut v = Client::connect(addr).await;
    w.command("join lobby").await;
    y.command("join lobby").await;
    v.command("join lobby").await;

    drop(w);

    // a later message still reaches the remaining member
    y.command("send after w").await;
    assert_eq!(v.expect("\r\n").await, "after w\r\n");
}

#[tokio::test]
async fn test_usage_and_unknown_commands() {
    let addr = start_server().await;
    let mut x = Client::connect(addr).await;

    assert_eq!(x.command("join").await, "Usage: join <room>\r\n> ");
    assert!(x
        .command("dance")
        .await
        .starts_with("Unknown command: dance\r\n"));
    assert_eq!(x.command("").await, "> ");
}

#[tokio::test]
async fn test_exit_closes_connection() {
    let addr = start_server().await;
    let mut x = Client::connect(addr).await;

    x.line("exit").await;
    x.expect("Good Bye!\r\n").await;

    let mut buf = [0u8; 64];
    let n = timeout(WAIT, x.stream.read(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn test_telnet_negotiation_is_ignored() {
    let addr = start_server().await;
    let mut x = Client::connect(addr).await;

    // IAC DO ECHO, IAC WILL SUPPRESS-GO-AHEAD, then a command
    x.stream
        .write_all(&[255, 253, 1, 255, 251, 3])
        .await
        .unwrap();
    let reply = x.command("join lobby").await;

    assert_eq!(reply, "Joined room lobby\r\n> ");
}

#[tokio::test]
async fn test_send_keeps_spacing() {
    let addr = start_server().await;
    let mut x = Client::connect(addr).await;
    let mut y = Client::connect(addr).await;
    x.command("join lobby").await;
    y.command("join lobby").await;

    x.command("send a   b\tc").await;

    assert_eq!(y.expect("\r\n").await, "a   b\tc\r\n");
}
