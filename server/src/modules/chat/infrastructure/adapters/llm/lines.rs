// 将 HTTP 响应字节流切分为文本行
//
// SSE 与 NDJSON 都以换行分隔。多字节字符可能被拆在两个网络块之间，
// 所以先按字节缓冲，凑齐一整行再解码。
// 两个网络块之间超过 `idle` 没有数据视为连接中断，总时长不设上限。

use futures::stream::{self, Stream, StreamExt};
use std::fmt::Display;
use std::time::Duration;

use crate::modules::chat::ports::GatewayError;

pub(super) fn lines<S, B, E>(
    bytes: S,
    idle: Duration,
) -> impl Stream<Item = Result<String, GatewayError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Display + Send,
{
    stream::unfold(
        (Box::pin(bytes), Vec::<u8>::new(), false),
        move |(mut bytes, mut buffer, mut finished)| async move {
            loop {
                if let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let raw: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = decode(&raw);
                    return Some((Ok(line), (bytes, buffer, finished)));
                }

                if finished {
                    if buffer.is_empty() {
                        return None;
                    }
                    let line = decode(&buffer);
                    buffer.clear();
                    return Some((Ok(line), (bytes, buffer, finished)));
                }

                let next = match tokio::time::timeout(idle, bytes.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        buffer.clear();
                        finished = true;
                        return Some((
                            Err(GatewayError::Network(format!(
                                "No data received for {}s",
                                idle.as_secs()
                            ))),
                            (bytes, buffer, finished),
                        ));
                    }
                };

                match next {
                    Some(Ok(chunk)) => buffer.extend_from_slice(chunk.as_ref()),
                    Some(Err(e)) => {
                        buffer.clear();
                        finished = true;
                        return Some((
                            Err(GatewayError::Network(e.to_string())),
                            (bytes, buffer, finished),
                        ));
                    }
                    None => finished = true,
                }
            }
        },
    )
}

fn decode(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(&['\r', '\n'][..])
        .to_string()
}
