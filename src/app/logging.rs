// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::TELEGRAM_API_BASE;
use std::fmt::Write as _;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub fn setup_logging(log_level: &str, json_format: bool, notify: Option<NotifyLayer>) {
    // A bare level gets quiet defaults for the HTTP stack; full directive
    // strings are respected as-is.
    let normalized = log_level.trim();
    let filter_spec = if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!(
            "{},h2=info,hyper=info,hyper_util=info,reqwest=info,alloy_transport_http=info",
            normalized
        )
    };
    let filter = EnvFilter::from_str(&filter_spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let notify_enabled = notify.is_some();
    let subscriber = tracing_subscriber::registry().with(filter).with(notify);

    if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).init();
    }

    tracing::info!(
        target: "logging",
        filter = %filter_spec,
        format = if json_format { "json" } else { "compact" },
        telegram = notify_enabled,
        "Logging initialized"
    );
}

/// Forwards selected events to a channel drained by a notifier task.
/// Events carrying `notify = true` are forwarded regardless of level.
pub struct NotifyLayer {
    tx: mpsc::UnboundedSender<String>,
    levels: Vec<Level>,
}

impl NotifyLayer {
    pub fn new(levels: &[String]) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut parsed: Vec<Level> = levels
            .iter()
            .filter_map(|l| Level::from_str(l.trim()).ok())
            .collect();
        if parsed.is_empty() {
            parsed.push(Level::ERROR);
        }
        (Self { tx, levels: parsed }, rx)
    }
}

#[derive(Default)]
struct NotifyVisitor {
    message: String,
    fields: String,
    notify: bool,
}

impl Visit for NotifyVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "notify" {
            self.notify = value;
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

impl<S: Subscriber> Layer<S> for NotifyLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target() == "notify" {
            return;
        }
        let mut visitor = NotifyVisitor::default();
        event.record(&mut visitor);
        if !visitor.notify && !self.levels.contains(meta.level()) {
            return;
        }
        let line = format!(
            "{} | {}{}",
            meta.level(),
            visitor.message,
            visitor.fields
        );
        let _ = self.tx.send(line);
    }
}

/// Delivers each line until the channel closes or `shutdown` fires. Lines
/// already queued at shutdown are still delivered.
async fn pump<F, Fut>(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut shutdown: oneshot::Receiver<()>,
    mut deliver: F,
) where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ()>,
{
    loop {
        tokio::select! {
            line = rx.recv() => match line {
                Some(line) => deliver(line).await,
                None => return,
            },
            _ = &mut shutdown => break,
        }
    }
    while let Ok(line) = rx.try_recv() {
        deliver(line).await;
    }
}

/// Background task posting notification lines to a Telegram bot.
pub struct TelegramNotifier {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl TelegramNotifier {
    pub fn spawn(
        client: reqwest::Client,
        bot_token: String,
        chat_ids: Vec<i64>,
        rx: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        let (shutdown, shutdown_rx) = oneshot::channel();
        let url = format!("{TELEGRAM_API_BASE}/bot{bot_token}/sendMessage");
        let task = tokio::spawn(pump(rx, shutdown_rx, move |text| {
            let client = client.clone();
            let url = url.clone();
            let chat_ids = chat_ids.clone();
            async move {
                for chat_id in chat_ids {
                    let body = serde_json::json!({ "chat_id": chat_id, "text": text });
                    match client.post(&url).json(&body).send().await {
                        Ok(resp) if !resp.status().is_success() => {
                            tracing::debug!(target: "notify", status = %resp.status(), "Telegram rejected message");
                        }
                        Err(e) => {
                            tracing::debug!(target: "notify", error = %e, "Telegram send failed");
                        }
                        Ok(_) => {}
                    }
                }
            }
        }));
        Self { shutdown, task }
    }

    /// Sends what is still queued, then stops. Gives up after `limit`.
    pub async fn flush(self, limit: Duration) {
        let _ = self.shutdown.send(());
        if tokio::time::timeout(limit, self.task).await.is_err() {
            tracing::debug!(target: "notify", "Telegram flush timed out");
        }
    }
}
