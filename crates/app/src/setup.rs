//! First-run / recovery screens, one per health state.

use crate::types::AppState;
use eframe::egui;
use gemini_cli::HealthState;

const AI_STUDIO_URL: &str = "https://aistudio.google.com/app/apikey";

pub fn render(s: &mut AppState, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        ui.add_space(60.0);
        ui.vertical_centered(|ui| {
            ui.heading(egui::RichText::new("Gemini Desk").size(28.0));
            ui.add_space(6.0);
            ui.label(
                egui::RichText::new("Chat with Gemini through the official CLI")
                    .size(13.0)
                    .weak(),
            );
            ui.add_space(32.0);

            match s.health_state {
                HealthState::Checking => render_checking(ui),
                HealthState::NeedsCli => render_needs_cli(s, ui),
                HealthState::NeedsKey => render_needs_key(s, ui),
                HealthState::Error => render_error(s, ui),
                // Ready flips the screen in poll_health; this frame is
                // transitional.
                HealthState::Ready => {
                    ui.label("All set.");
                }
            }
        });
    });
}

fn render_checking(ui: &mut egui::Ui) {
    ui.spinner();
    ui.add_space(8.0);
    ui.label("Checking your Gemini CLI setup...");
}

fn render_needs_cli(s: &mut AppState, ui: &mut egui::Ui) {
    ui.label(egui::RichText::new("The Gemini CLI is not installed").size(17.0).strong());
    ui.add_space(6.0);
    if !s.health_detail.is_empty() {
        ui.label(egui::RichText::new(&s.health_detail).weak());
        ui.add_space(6.0);
    }
    ui.label("Gemini Desk talks to Google through the free `gemini` command-line tool.");
    ui.label(
        egui::RichText::new(format!("Platform: {}", s.cli.os.label()))
            .size(11.0)
            .weak(),
    );
    ui.add_space(16.0);

    let hover = if s.cli.os.is_windows() {
        "Installs through npm"
    } else {
        "Tries npm first, then Homebrew"
    };
    ui.add_enabled_ui(!s.health_busy, |ui| {
        if ui
            .add_sized(
                [220.0, 36.0],
                egui::Button::new("Install the Gemini CLI")
                    .fill(egui::Color32::from_rgb(70, 130, 180)),
            )
            .on_hover_text(hover)
            .clicked()
        {
            s.start_install();
        }
        ui.add_space(8.0);
        if ui.button("Check again").clicked() {
            s.start_health_check();
        }
    });
}

fn render_needs_key(s: &mut AppState, ui: &mut egui::Ui) {
    ui.label(egui::RichText::new("An API key is needed").size(17.0).strong());
    ui.add_space(6.0);
    if !s.health_detail.is_empty() {
        ui.label(egui::RichText::new(&s.health_detail).weak());
        ui.add_space(6.0);
    }
    if ui.link("Get a free key at Google AI Studio").clicked() {
        let _ = open::that(AI_STUDIO_URL);
    }
    ui.add_space(12.0);

    ui.horizontal(|ui| {
        ui.add_space(ui.available_width() / 2.0 - 170.0);
        ui.add_sized(
            [280.0, 28.0],
            egui::TextEdit::singleline(&mut s.api_key_input)
                .password(true)
                .hint_text("AIza..."),
        );
        let can_save = !s.api_key_input.trim().is_empty() && !s.health_busy;
        if ui.add_enabled(can_save, egui::Button::new("Save key")).clicked() {
            s.submit_api_key();
        }
    });

    if let Some(err) = &s.key_error {
        ui.add_space(6.0);
        ui.colored_label(egui::Color32::from_rgb(220, 120, 100), err);
    }

    ui.add_space(12.0);
    ui.label(
        egui::RichText::new("The key is stored in a local env file and never leaves this machine.")
            .size(11.0)
            .weak(),
    );
    ui.add_space(8.0);
    ui.add_enabled_ui(!s.health_busy, |ui| {
        if ui.button("Check again").clicked() {
            s.start_health_check();
        }
    });
}

fn render_error(s: &mut AppState, ui: &mut egui::Ui) {
    ui.label(egui::RichText::new("Setup hit a problem").size(17.0).strong());
    ui.add_space(6.0);
    ui.label(&s.health_detail);
    ui.add_space(16.0);
    ui.add_enabled_ui(!s.health_busy, |ui| {
        if ui.button("Try again").clicked() {
            s.start_health_check();
        }
    });
}
