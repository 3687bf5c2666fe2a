//! Background workers: each runs on its own thread with a private
//! tokio runtime and reports back over an mpsc channel the UI polls.

use crate::types::{HealthReport, TurnResult};
use gemini_cli::{CliContext, HealthCheck, HealthState, Invocation, Outcome, TurnRunner};
use shared::settings::GeminiSettings;
use std::sync::mpsc::Sender;

pub fn run_health_check(ctx: CliContext, settings: GeminiSettings, tx: Sender<HealthReport>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(HealthReport {
                    state: HealthState::Error,
                    detail: format!("Failed to start async runtime: {}", e),
                });
                return;
            }
        };
        let report = rt.block_on(async {
            let mut health = HealthCheck::new();
            health.recheck(&ctx, &settings).await;
            HealthReport {
                state: health.state,
                detail: health.detail,
            }
        });
        let _ = tx.send(report);
    });
}

pub fn run_install(ctx: CliContext, settings: GeminiSettings, tx: Sender<HealthReport>) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(HealthReport {
                    state: HealthState::Error,
                    detail: format!("Failed to start async runtime: {}", e),
                });
                return;
            }
        };
        let report = rt.block_on(async {
            let mut health = HealthCheck::new();
            health.install_cli(&ctx, &settings).await;
            HealthReport {
                state: health.state,
                detail: health.detail,
            }
        });
        let _ = tx.send(report);
    });
}

pub fn run_chat_turn(
    ctx: CliContext,
    invocation: Invocation,
    chat_id: String,
    user_message: String,
    tx: Sender<TurnResult>,
) {
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = tx.send(TurnResult {
                    chat_id,
                    user_message,
                    outcome: Outcome::GenericError(format!("Failed to start async runtime: {}", e)),
                });
                return;
            }
        };
        let outcome = rt.block_on(async { TurnRunner::new(&ctx).run(&invocation).await });
        let _ = tx.send(TurnResult {
            chat_id,
            user_message,
            outcome,
        });
    });
}
