// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! The isolated analysis worker
//!
//! A worker handles exactly one request: it reads one message, runs the
//! audit + classification pipeline once and writes one reply. It never
//! retries and never reads a second message.

pub mod protocol;

pub use protocol::{decode_line, encode_line, AnalysisRequest, WorkerReply};

use chrono::Utc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::audit::{AuditOptions, AuditSource};
use crate::classifier::build_result;
use crate::config::ClassificationMode;
use crate::error::{Error, ErrorReply, Result};
use crate::result::AnalysisResult;

/// Audit one URL and shape the report. The timestamp is taken here, once,
/// outside classification.
pub async fn run_pipeline(
    source: &dyn AuditSource,
    request: &AnalysisRequest,
    mode: ClassificationMode,
) -> Result<AnalysisResult> {
    request.validate()?;
    let url = request.url.trim();

    let report = source.run_audit(url, &AuditOptions::default()).await?;
    Ok(build_result(mode, url, &report, Utc::now()))
}

/// Serve exactly one request from `input`, answering on `output`.
///
/// Pipeline failures become an `{ "error": ... }` reply and still return
/// `Ok`. An `Err` means the channel itself is unusable (nothing to read,
/// or the reply could not be written); the worker then exits non-zero.
pub async fn serve_once<R, W>(
    mut input: R,
    mut output: W,
    source: &dyn AuditSource,
    mode: ClassificationMode,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Err(Error::WorkerTransport(
            "channel closed before a request arrived".to_string(),
        ));
    }

    let reply = match decode_line::<AnalysisRequest>(&line) {
        Ok(request) => {
            info!("Worker received request for {}", request.url);
            let outcome = run_pipeline(source, &request, mode).await;
            if let Err(ref e) = outcome {
                error!("Analysis of {} failed: {}", request.url, e);
            }
            WorkerReply::from_result(outcome)
        }
        Err(e) => WorkerReply::Failure(ErrorReply::from(&Error::InvalidRequest(format!(
            "unreadable request message: {}",
            e
        )))),
    };

    output.write_all(&encode_line(&reply)?).await?;
    output.flush().await?;
    Ok(())
}
