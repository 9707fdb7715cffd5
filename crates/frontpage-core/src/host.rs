//! Line-delimited JSON host loop
//!
//! One command per input line, one reply per output line. Blank lines are
//! skipped. The loop ends at end of input.
//!
//! Commands run one at a time in input order, so `frontpage-get-status` here
//! only ever reports `absent` or `active`. The transient `authenticating` and
//! `refreshing` phases are observable through [`SessionManager::state`]
//! by library callers that overlap operations.
//!
//! [`SessionManager::state`]: frontpage_session::SessionManager::state

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::frontpage::Frontpage;

pub async fn serve<R, W>(app: &Frontpage, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0usize;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = app.handle_message(line).await;
        writer.write_all(reply.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        handled += 1;
    }

    tracing::info!(handled, "Input closed, host stopping");
    Ok(())
}
