use eframe::egui;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

mod chat_view;
mod setup;
mod types;
mod workers;

use types::{AppScreen, AppState};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([800.0, 560.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Gemini Desk",
        options,
        Box::new(|_cc| {
            Box::new(GeminiDeskApp {
                state: Arc::new(Mutex::new(AppState::new())),
            })
        }),
    )
}

struct GeminiDeskApp {
    state: Arc<Mutex<AppState>>,
}

impl eframe::App for GeminiDeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut s = self.state.lock();

        // Poll background results (non-blocking)
        s.poll_health();
        s.poll_turn();
        s.usage.tick();

        // Keep polling while anything is in flight
        if s.is_thinking || s.health_busy {
            ctx.request_repaint_after(Duration::from_millis(120));
        }

        match s.screen {
            AppScreen::Setup => setup::render(&mut s, ctx),
            AppScreen::Chat => chat_view::render(&mut s, ctx),
        }
    }
}
