//! In-process AMI stub server for integration tests.

#![allow(dead_code)]

use asterisk_ami_tokio::{AmiClient, AmiConnectOptions};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const GREETING: &str = "Asterisk Call Manager/5.0.1\r\n";

/// What the stub does after receiving a request.
pub enum Reply {
    /// Write this text, split in two chunks with a short pause between.
    Text(String),
    /// Wait, then reply as with `Text`.
    Delayed(Duration, String),
    /// Write nothing and keep the connection open.
    Silent,
    /// Close the connection without replying.
    Close,
}

pub fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

pub struct StubServer {
    pub port: u16,
    requests: Arc<Mutex<Vec<String>>>,
    task: JoinHandle<()>,
}

impl StubServer {
    /// Every request received so far, in wire form.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .clone()
    }

    pub fn options(&self) -> AmiConnectOptions {
        AmiConnectOptions::new("127.0.0.1")
            .with_port(self.port)
            .with_read_timeout(Duration::from_millis(200))
            .with_response_timeout(Duration::from_secs(5))
    }

    /// A client for this stub, already connected.
    pub async fn client(&self) -> AmiClient {
        let client = AmiClient::new(self.options())
            .await
            .unwrap();
        client
            .connect()
            .await
            .unwrap();
        client
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task
            .abort();
    }
}

/// Start a stub that greets each connection like Asterisk does, then answers
/// every request (read up to its blank line) with `handler`. Connections are
/// served one after another.
pub async fn stub_server<F>(handler: F) -> StubServer
where
    F: Fn(&str) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap();
    let port = listener
        .local_addr()
        .unwrap()
        .port();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let recorded = requests.clone();

    let task = tokio::spawn(async move {
        while let Ok((stream, _)) = listener
            .accept()
            .await
        {
            let mut stream = BufReader::new(stream);
            if stream
                .get_mut()
                .write_all(GREETING.as_bytes())
                .await
                .is_err()
            {
                continue;
            }

            'connection: loop {
                let mut request = String::new();
                loop {
                    let mut line = String::new();
                    match stream
                        .read_line(&mut line)
                        .await
                    {
                        Ok(0) | Err(_) => break 'connection,
                        Ok(_) => {}
                    }
                    request.push_str(&line);
                    if line == "\r\n" {
                        break;
                    }
                }
                recorded
                    .lock()
                    .unwrap()
                    .push(request.clone());

                let reply = match handler(&request) {
                    Reply::Text(reply) => reply,
                    Reply::Delayed(delay, reply) => {
                        tokio::time::sleep(delay).await;
                        reply
                    }
                    Reply::Silent => continue,
                    Reply::Close => break,
                };
                let mid = reply.len() / 2;
                let mid = (mid..=reply.len())
                    .find(|i| reply.is_char_boundary(*i))
                    .unwrap_or(reply.len());
                let (first, second) = reply.split_at(mid);
                let writer = stream.get_mut();
                if writer
                    .write_all(first.as_bytes())
                    .await
                    .is_err()
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
                if writer
                    .write_all(second.as_bytes())
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    });

    StubServer {
        port,
        requests,
        task,
    }
}

/// Value of `name` in a wire-format request, if present.
pub fn field<'a>(request: &'a str, name: &str) -> Option<&'a str> {
    request
        .split("\r\n")
        .find_map(|line| {
            let (key, value) = line.split_once(": ")?;
            key.eq_ignore_ascii_case(name)
                .then_some(value)
        })
}

/// Reply used for any action the test does not care about.
pub const SUCCESS: &str = "Response: Success\r\nMessage: OK\r\n\r\n";
