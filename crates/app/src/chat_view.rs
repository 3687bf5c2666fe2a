//! The main chat screen: chat list, transcript, input bar, usage
//! meters, and the settings dialog.

use crate::types::AppState;
use eframe::egui;
use shared::chat::{ConversationMode, Message};
use shared::settings::KNOWN_MODELS;

pub fn render(s: &mut AppState, ctx: &egui::Context) {
    render_header(s, ctx);
    render_sidebar(s, ctx);
    render_chat(s, ctx);
    if s.show_settings {
        render_settings(s, ctx);
    }
}

fn render_header(s: &mut AppState, ctx: &egui::Context) {
    egui::TopBottomPanel::top("header").show(ctx, |ui| {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.add_space(12.0);
            ui.heading(egui::RichText::new("Gemini Desk").size(20.0));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add_space(12.0);
                if ui.button("Settings").clicked() {
                    s.show_settings = true;
                }
                ui.add_space(8.0);
                ui.label(
                    egui::RichText::new(format!("⚡ {}", s.settings.model))
                        .size(11.0)
                        .color(egui::Color32::from_rgb(140, 180, 140)),
                );
            });
        });
        ui.add_space(8.0);
    });
}

fn render_sidebar(s: &mut AppState, ctx: &egui::Context) {
    egui::SidePanel::left("chats")
        .default_width(220.0)
        .min_width(180.0)
        .show(ctx, |ui| {
            ui.add_space(8.0);
            if ui
                .add_sized([ui.available_width(), 30.0], egui::Button::new("+ New chat"))
                .clicked()
            {
                s.new_chat();
            }
            ui.add_space(8.0);
            ui.separator();

            // Snapshot first; selection and deletion mutate the store.
            let entries: Vec<(String, String)> = s
                .chats
                .list()
                .iter()
                .map(|c| (c.id.clone(), c.title.clone()))
                .collect();
            let mut selected: Option<String> = None;
            let mut deleted: Option<String> = None;

            egui::ScrollArea::vertical()
                .max_height(ui.available_height() - 120.0)
                .show(ui, |ui| {
                    for (id, title) in &entries {
                        let is_active = s.active_chat.as_deref() == Some(id.as_str());
                        ui.horizontal(|ui| {
                            if ui
                                .selectable_label(is_active, egui::RichText::new(title).size(12.0))
                                .clicked()
                            {
                                selected = Some(id.clone());
                            }
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("🗑").on_hover_text("Delete chat").clicked()
                                    {
                                        deleted = Some(id.clone());
                                    }
                                },
                            );
                        });
                    }
                });

            if let Some(id) = selected {
                s.active_chat = Some(id);
                s.conversation.clear_history();
            }
            if let Some(id) = deleted {
                s.delete_chat(&id);
            }

            ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
                ui.add_space(8.0);
                render_usage(s, ui);
                ui.separator();
            });
        });
}

fn render_usage(s: &AppState, ui: &mut egui::Ui) {
    let data = s.usage.data();
    ui.label(egui::RichText::new("Usage today").size(11.0).strong());
    ui.add(
        egui::ProgressBar::new(s.usage.daily_fraction())
            .text(format!("{} / {}", data.requests, data.daily_limit)),
    );
    ui.add_space(4.0);
    ui.label(egui::RichText::new("This minute").size(11.0).strong());
    ui.add(
        egui::ProgressBar::new(s.usage.minute_fraction())
            .text(format!("{} / {}", data.minute_requests, data.rpm_limit)),
    );
    ui.add_space(2.0);
    ui.label(
        egui::RichText::new(format!("{} requests left today", s.usage.remaining()))
            .size(10.0)
            .weak(),
    );
}

fn render_chat(s: &mut AppState, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| {
        render_conversation_bar(s, ui);
        ui.add_space(4.0);

        let messages: Vec<Message> = s
            .active_chat
            .as_deref()
            .and_then(|id| s.chats.get(id))
            .map(|c| c.messages.clone())
            .unwrap_or_default();
        let is_thinking = s.is_thinking;
        let chat_height = ui.available_height() - 70.0;

        egui::ScrollArea::vertical()
            .max_height(chat_height)
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                if messages.is_empty() && !is_thinking {
                    ui.add_space(24.0);
                    ui.vertical_centered(|ui| {
                        ui.label(
                            egui::RichText::new("Ask Gemini anything to get started.")
                                .size(14.0)
                                .weak(),
                        );
                    });
                }
                for msg in &messages {
                    ui.add_space(6.0);
                    render_message(ui, msg);
                }
                if is_thinking {
                    ui.add_space(6.0);
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(egui::RichText::new("Thinking...").italics().weak());
                    });
                    ui.ctx().request_repaint();
                }
            });

        ui.add_space(8.0);
        render_input_row(s, ui);
    });
}

fn render_conversation_bar(s: &mut AppState, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        let mut enabled = s.conversation.enabled;
        if ui
            .checkbox(&mut enabled, "Conversation mode")
            .on_hover_text("Carry previous turns as context for the next message")
            .changed()
        {
            if enabled {
                s.conversation = ConversationMode::start();
            } else {
                s.conversation.stop();
            }
        }
        if s.conversation.enabled {
            let turns = s.conversation.message_history.len() / 2;
            ui.label(
                egui::RichText::new(format!("{} remembered turns", turns))
                    .size(11.0)
                    .weak(),
            );
            if ui.small_button("Clear context").clicked() {
                s.conversation.clear_history();
            }
        }
    });
}

fn render_message(ui: &mut egui::Ui, msg: &Message) {
    let is_user = msg.role == "user";
    let fill = if is_user {
        egui::Color32::from_rgb(45, 70, 100)
    } else {
        egui::Color32::from_rgb(50, 50, 58)
    };
    let layout = if is_user {
        egui::Layout::right_to_left(egui::Align::Min)
    } else {
        egui::Layout::left_to_right(egui::Align::Min)
    };
    ui.with_layout(layout, |ui| {
        egui::Frame::none()
            .fill(fill)
            .rounding(egui::Rounding::same(10.0))
            .inner_margin(egui::Margin::same(10.0))
            .show(ui, |ui| {
                ui.set_max_width(ui.available_width() * 0.75);
                ui.vertical(|ui| {
                    ui.label(egui::RichText::new(&msg.content).size(13.0));
                    let when = msg
                        .timestamp
                        .with_timezone(&chrono::Local)
                        .format("%H:%M")
                        .to_string();
                    let tag = match &msg.model {
                        Some(model) if !is_user => format!("{} · {}", when, model),
                        _ => when,
                    };
                    ui.label(egui::RichText::new(tag).size(9.0).weak());
                });
            });
    });
}

fn render_input_row(s: &mut AppState, ui: &mut egui::Ui) {
    if !s.attachments.is_empty() {
        ui.horizontal_wrapped(|ui| {
            let mut remove: Option<usize> = None;
            for (i, file) in s.attachments.iter().enumerate() {
                if ui
                    .small_button(format!("📄 {} ✕", file.name))
                    .on_hover_text("Remove attachment")
                    .clicked()
                {
                    remove = Some(i);
                }
            }
            if let Some(i) = remove {
                s.attachments.remove(i);
            }
        });
        ui.add_space(4.0);
    }

    ui.horizontal(|ui| {
        if ui
            .add_sized([36.0, 40.0], egui::Button::new("📎"))
            .on_hover_text("Attach text files")
            .clicked()
        {
            s.pick_attachments();
        }

        let response = ui.add_sized(
            [ui.available_width() - 80.0, 40.0],
            egui::TextEdit::singleline(&mut s.input_text)
                .hint_text("Message Gemini...")
                .font(egui::FontId::new(14.0, egui::FontFamily::Proportional)),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            s.send_message();
        }

        let send = egui::Button::new("Send").fill(egui::Color32::from_rgb(70, 130, 180));
        let clicked = ui
            .add_enabled_ui(!s.is_thinking, |ui| ui.add_sized([70.0, 40.0], send).clicked())
            .inner;
        if clicked {
            s.send_message();
        }
    });
}

fn render_settings(s: &mut AppState, ctx: &egui::Context) {
    let mut open = true;
    egui::Window::new("Settings")
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.set_min_width(360.0);

            let mut changed = false;

            egui::ComboBox::from_label("Model")
                .selected_text(s.settings.model.clone())
                .show_ui(ui, |ui| {
                    for model in KNOWN_MODELS {
                        if ui
                            .selectable_value(&mut s.settings.model, model.to_string(), *model)
                            .clicked()
                        {
                            changed = true;
                        }
                    }
                });

            ui.add_space(8.0);
            changed |= ui
                .checkbox(&mut s.settings.sandbox, "Sandbox mode")
                .on_hover_text("Run generated code in a sandbox")
                .changed();
            changed |= ui
                .checkbox(&mut s.settings.all_files, "Include all files")
                .changed();
            changed |= ui
                .checkbox(&mut s.settings.show_memory_usage, "Show memory usage")
                .changed();
            changed |= ui.checkbox(&mut s.settings.debug, "Debug output").changed();

            ui.add_space(8.0);
            ui.label("Allowed MCP servers (comma separated)");
            changed |= ui.text_edit_singleline(&mut s.mcp_input).changed();
            ui.label("Extensions (comma separated)");
            changed |= ui.text_edit_singleline(&mut s.ext_input).changed();

            if changed {
                s.apply_settings();
            }

            ui.add_space(12.0);
            ui.separator();
            ui.add_space(4.0);
            if ui
                .button("Run setup check again")
                .on_hover_text("Re-verify the CLI and API key")
                .clicked()
            {
                s.show_settings = false;
                s.start_health_check();
            }
        });
    if !open {
        s.show_settings = false;
    }
}
