//! Message sources feeding the ingestion loop.
//!
//! A source yields raw serialized orders one at a time. Delivery is
//! at-least-once: the same payload may arrive more than once, which the
//! upsert-based write path tolerates.

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

/// Errors reported when pulling from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The pull was cancelled; the loop stops without backing off.
    #[error("Source pull cancelled")]
    Cancelled,

    #[error("Source transport error: {0}")]
    Transport(String),

    #[error("Source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A pull-based stream of serialized orders.
#[async_trait]
pub trait MessageSource: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Pull the next payload.
    ///
    /// `Ok(None)` means the stream has ended and no more messages will come.
    /// Implementations must be cancel-safe: the loop drops this future when
    /// shutdown is signalled.
    async fn next_message(&mut self) -> Result<Option<Vec<u8>>, SourceError>;

    /// Release the source. Called once when the loop exits.
    async fn close(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

// ============================================================================
// CHANNEL SOURCE
// ============================================================================

/// Item carried by a [`ChannelSource`]: a payload, or a pull error to report.
pub type ChannelItem = Result<Vec<u8>, SourceError>;

/// In-process source fed through a tokio mpsc channel.
pub struct ChannelSource {
    rx: mpsc::Receiver<ChannelItem>,
    closed: bool,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<ChannelItem>) -> Self {
        Self { rx, closed: false }
    }

    /// Create a bounded channel and the source reading from it.
    pub fn channel(capacity: usize) -> (mpsc::Sender<ChannelItem>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl MessageSource for ChannelSource {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn next_message(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        match self.rx.recv().await {
            Some(item) => item.map(Some),
            None => Ok(None),
        }
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.rx.close();
        self.closed = true;
        Ok(())
    }
}

// ============================================================================
// LINES SOURCE
// ============================================================================

/// Newline-delimited JSON from any async reader. Blank lines are skipped.
pub struct LinesSource<R> {
    lines: Lines<R>,
}

impl<R> LinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl LinesSource<BufReader<Stdin>> {
    /// Read orders from standard input.
    ///
    /// Tokio reads stdin on a blocking thread that cannot be interrupted, so
    /// process exit may wait for a pending line or EOF.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> MessageSource for LinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "lines"
    }

    async fn next_message(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        while let Some(line) = self.lines.next_line().await? {
            if !line.trim().is_empty() {
                return Ok(Some(line.into_bytes()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_yields_then_ends() {
        let (tx, mut source) = ChannelSource::channel(4);
        tx.send(Ok(b"one".to_vec())).await.unwrap();
        tx.send(Err(SourceError::Transport("broker gone".into())))
            .await
            .unwrap();
        drop(tx);

        assert_eq!(source.next_message().await.unwrap(), Some(b"one".to_vec()));
        assert!(matches!(
            source.next_message().await,
            Err(SourceError::Transport(_))
        ));
        assert_eq!(source.next_message().await.unwrap(), None);

        source.close().await.unwrap();
        assert!(source.is_closed());
    }

    #[tokio::test]
    async fn test_lines_source_skips_blank_lines() {
        let input: &[u8] = b"{\"a\":1}\n\n   \n{\"b\":2}\n";
        let mut source = LinesSource::new(input);

        assert_eq!(
            source.next_message().await.unwrap(),
            Some(b"{\"a\":1}".to_vec())
        );
        assert_eq!(
            source.next_message().await.unwrap(),
            Some(b"{\"b\":2}".to_vec())
        );
        assert_eq!(source.next_message().await.unwrap(), None);
        assert_eq!(source.name(), "lines");
    }
}
