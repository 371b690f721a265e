use std::path::Path;

use anyhow::Context;
use dioxus::prelude::*;
use rfd::FileDialog;

use crate::config::AppConfig;
use crate::domain::entities::contact::{ContactFields, ImportRow};
use crate::domain::entities::session::WizardStep;
use crate::domain::rules::columns::ContactColumn;
use crate::format_bytes;
use crate::infra::import::export::{invalid_rows_csv, template_csv, TEMPLATE_FILE_NAME};
use crate::platform::desktop::blocking::run_blocking;
use crate::ui::state::app_state::AppState;
use crate::usecase::services::preview_controller::RowFilter;
use crate::usecase::services::upload_controller::{
    read_upload, SelectedFile, UploadError, UploadOutcome,
};
use crate::usecase::services::wizard::ImportWizard;

const STEPS: [WizardStep; 3] = [WizardStep::Upload, WizardStep::Preview, WizardStep::Complete];
const BUTTON_STYLE: &str =
    "border: 1px solid #bbb; background: #fff; padding: 6px 12px; border-radius: 6px; cursor: pointer;";
const PRIMARY_BUTTON_STYLE: &str =
    "border: 1px solid #2f5fd0; background: #2f5fd0; color: #fff; padding: 6px 12px; border-radius: 6px; cursor: pointer;";
const CELL_STYLE: &str = "padding: 6px 8px; border-bottom: 1px solid #eee; text-align: left;";

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("contacts.csv")
        .to_string()
}

fn read_selected_file(path: &Path, max_bytes: u64) -> Result<SelectedFile, UploadError> {
    let size = std::fs::metadata(path)
        .map_err(|err| UploadError::Unreadable(err.to_string()))?
        .len();
    if size > max_bytes {
        return Err(UploadError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let bytes = std::fs::read(path).map_err(|err| UploadError::Unreadable(err.to_string()))?;
    Ok(SelectedFile::new(file_name_of(path), bytes))
}

fn start_upload(mut wizard: Signal<ImportWizard>, mut status: Signal<String>) {
    if wizard.read().upload().is_busy() {
        return;
    }

    let Some(path) = FileDialog::new()
        .add_filter("CSV", &["csv"])
        .pick_file()
    else {
        status.set("Upload cancelled".to_string());
        return;
    };

    let begun = wizard.write().begin_upload();
    let ticket = match begun {
        Ok(ticket) => ticket,
        Err(err) => {
            status.set(err.to_string());
            return;
        }
    };
    let max_bytes = wizard.read().upload().max_bytes();
    let file_name = file_name_of(&path);
    status.set(format!("Reading {file_name}"));

    spawn(async move {
        let result = run_blocking("parse_upload", || {
            read_selected_file(&path, max_bytes).and_then(|file| read_upload(&file, max_bytes))
        });
        let outcome = wizard.write().finish_upload(ticket, &file_name, result);
        match outcome {
            UploadOutcome::Advanced {
                rows,
                valid,
                invalid,
            } => status.set(format!(
                "{file_name}: {rows} rows, {valid} ready, {invalid} need attention"
            )),
            UploadOutcome::Rejected(_) => status.set(format!("{file_name} could not be imported")),
            UploadOutcome::Discarded => {}
        }
    });
}

fn save_csv(
    mut status: Signal<String>,
    default_name: &str,
    what: &str,
    content: anyhow::Result<String>,
) {
    let Some(path) = FileDialog::new()
        .set_file_name(default_name)
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return;
    };

    let result = content.and_then(|content| {
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))
    });
    match result {
        Ok(()) => status.set(format!("{what} saved to {}", path.display())),
        Err(err) => status.set(format!("Could not save {what}: {err:#}")),
    }
}

#[component]
fn StepHeader(step: WizardStep) -> Element {
    rsx! {
        nav {
            style: "display: flex; gap: 16px; padding: 8px 0; border-bottom: 1px solid #ddd;",
            {STEPS.iter().map(|candidate| {
                let weight = if *candidate == step { "bold" } else { "normal" };
                let color = if *candidate == step { "#2f5fd0" } else { "#777" };
                let position = candidate.position();
                let label = candidate.label();
                rsx!(
                    span {
                        style: "font-weight: {weight}; color: {color};",
                        "{position}. {label}"
                    }
                )
            })}
        }
    }
}

#[component]
fn UploadStep(wizard: Signal<ImportWizard>, status: Signal<String>) -> Element {
    let (busy, errors, max_bytes) = {
        let current = wizard.read();
        let upload = current.upload();
        (upload.is_busy(), upload.errors().to_vec(), upload.max_bytes())
    };
    let limit = format_bytes(max_bytes);

    rsx! {
        section {
            style: "display: flex; flex-direction: column; gap: 12px; padding: 16px 0;",
            h2 { "Upload contacts" }
            p {
                "Choose a comma-separated file with a header row. Recognised columns: first name, last name, email, telephone. Files up to {limit}."
            }
            div {
                style: "display: flex; gap: 12px;",
                button {
                    style: PRIMARY_BUTTON_STYLE,
                    disabled: busy,
                    onclick: move |_| start_upload(wizard, status),
                    if busy { "Processing..." } else { "Choose CSV file" }
                }
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        save_csv(status, TEMPLATE_FILE_NAME, "Template", template_csv());
                    },
                    "Download template"
                }
            }
            if !errors.is_empty() {
                ul {
                    style: "color: #b00020; margin: 0;",
                    {errors.iter().map(|reason| rsx!(li { "{reason}" }))}
                }
            }
        }
    }
}

#[component]
fn RowLine(row: ImportRow, wizard: Signal<ImportWizard>, status: Signal<String>) -> Element {
    let id = row.id;
    let ContactFields {
        first_name,
        last_name,
        email,
        telephone,
    } = row.fields().clone();
    let (marker, marker_color) = if row.is_valid() {
        ("OK", "#1b7f3b")
    } else {
        ("!", "#b00020")
    };
    let detail = if row.is_valid() {
        "Ready to import".to_string()
    } else {
        row.errors().join("\n")
    };
    let mut wizard = wizard;
    let mut status = status;

    rsx! {
        tr {
            td {
                style: "{CELL_STYLE} color: {marker_color}; font-weight: bold;",
                title: "{detail}",
                "{marker}"
            }
            td { style: CELL_STYLE, "{first_name}" }
            td { style: CELL_STYLE, "{last_name}" }
            td { style: CELL_STYLE, "{email}" }
            td { style: CELL_STYLE, "{telephone}" }
            td {
                style: CELL_STYLE,
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        wizard.write().start_edit(id);
                    },
                    "Edit"
                }
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        let removed = wizard.write().delete_row(id);
                        if removed {
                            status.set("Row removed".to_string());
                        }
                    },
                    "Delete"
                }
            }
        }
    }
}

#[component]
fn EditRowDialog(wizard: Signal<ImportWizard>, status: Signal<String>) -> Element {
    let Some(draft) = wizard.read().preview().draft().cloned() else {
        return rsx! {};
    };
    let verdict = draft.verdict();
    let mut wizard = wizard;
    let mut status = status;

    rsx! {
        div {
            style: "position: fixed; inset: 0; background: rgba(0,0,0,0.3); display: flex; align-items: center; justify-content: center; z-index: 1200;",
            div {
                style: "background: #fff; border-radius: 8px; padding: 16px; min-width: 360px; display: flex; flex-direction: column; gap: 10px;",
                h3 { "Edit row" }
                {ContactColumn::ALL.into_iter().map(|column| {
                    let value = draft.fields.get(column).to_string();
                    let marker = if column.is_required() { " *" } else { "" };
                    let label = format!("{}{marker}", column.label());
                    rsx!(
                        label {
                            style: "display: flex; flex-direction: column; gap: 4px;",
                            span { "{label}" }
                            input {
                                value: "{value}",
                                oninput: move |event| {
                                    let value = event.value();
                                    wizard
                                        .write()
                                        .edit_draft(move |fields| fields.set(column, value));
                                }
                            }
                        }
                    )
                })}
                if !verdict.is_valid {
                    ul {
                        style: "color: #b00020; margin: 0;",
                        {verdict.errors.iter().map(|reason| rsx!(li { "{reason}" }))}
                    }
                }
                div {
                    style: "display: flex; gap: 8px; justify-content: flex-end;",
                    button {
                        style: BUTTON_STYLE,
                        onclick: move |_| wizard.write().preview_mut().cancel_edit(),
                        "Cancel"
                    }
                    button {
                        style: PRIMARY_BUTTON_STYLE,
                        onclick: move |_| {
                            let saved = wizard.write().save_edit();
                            let message = match saved {
                                Some(verdict) if verdict.is_valid => "Row updated",
                                Some(_) => "Row updated but still needs attention",
                                None => "Row no longer exists",
                            };
                            status.set(message.to_string());
                        },
                        "Save"
                    }
                }
            }
        }
    }
}

#[component]
fn PreviewStep(wizard: Signal<ImportWizard>, status: Signal<String>) -> Element {
    let (file_name, counts, rows, filter, search, all_rows, can_commit) = {
        let current = wizard.read();
        let preview = current.preview();
        let session = current.session();
        (
            session.session().file_name().unwrap_or_default().to_string(),
            preview.counts(session),
            preview
                .visible_rows(session)
                .into_iter()
                .cloned()
                .collect::<Vec<ImportRow>>(),
            preview.filter(),
            preview.search().to_string(),
            session.session().rows().to_vec(),
            preview.can_commit(session),
        )
    };
    let filters = [
        (RowFilter::All, format!("All ({})", counts.total)),
        (RowFilter::Valid, format!("Ready ({})", counts.valid)),
        (RowFilter::Invalid, format!("Needs attention ({})", counts.invalid)),
    ];
    let (total, valid, invalid) = (counts.total, counts.valid, counts.invalid);
    let mut wizard = wizard;
    let mut status = status;

    rsx! {
        section {
            style: "display: flex; flex-direction: column; gap: 12px; padding: 16px 0;",
            h2 { "Review {file_name}" }
            p { "{valid} of {total} rows are ready to import. Rows marked ! are skipped unless fixed." }
            div {
                style: "display: flex; gap: 8px; align-items: center; flex-wrap: wrap;",
                {filters.into_iter().map(|(candidate, label)| {
                    let style = if candidate == filter {
                        PRIMARY_BUTTON_STYLE
                    } else {
                        BUTTON_STYLE
                    };
                    rsx!(
                        button {
                            style: style,
                            onclick: move |_| wizard.write().preview_mut().set_filter(candidate),
                            "{label}"
                        }
                    )
                })}
                input {
                    placeholder: "Search name, email or phone",
                    value: "{search}",
                    oninput: move |event| wizard.write().preview_mut().set_search(event.value()),
                }
            }
            div {
                style: "max-height: 60vh; overflow-y: auto; border: 1px solid #ddd; border-radius: 6px;",
                table {
                    style: "border-collapse: collapse; width: 100%;",
                    thead {
                        tr {
                            th { style: CELL_STYLE, "" }
                            th { style: CELL_STYLE, "First name" }
                            th { style: CELL_STYLE, "Last name" }
                            th { style: CELL_STYLE, "Email" }
                            th { style: CELL_STYLE, "Telephone" }
                            th { style: CELL_STYLE, "" }
                        }
                    }
                    tbody {
                        {rows.into_iter().map(|row| {
                            let key = row.id.to_string();
                            rsx!(RowLine { key: "{key}", row, wizard, status })
                        })}
                    }
                }
            }
            div {
                style: "display: flex; gap: 12px;",
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        let result = wizard.write().back();
                        if let Err(err) = result {
                            status.set(err.to_string());
                        }
                    },
                    "Back"
                }
                button {
                    style: BUTTON_STYLE,
                    disabled: invalid == 0,
                    onclick: move |_| {
                        save_csv(
                            status,
                            "contacts_to_fix.csv",
                            "Rows needing attention",
                            invalid_rows_csv(&all_rows),
                        );
                    },
                    "Export rows needing attention"
                }
                button {
                    style: PRIMARY_BUTTON_STYLE,
                    disabled: !can_commit,
                    onclick: move |_| {
                        let result = wizard.write().commit();
                        match result {
                            Ok(imported) => status.set(format!("Imported {imported} contacts")),
                            Err(err) => status.set(format!("Import failed: {err}")),
                        }
                    },
                    "Import {valid} contacts"
                }
            }
        }
        EditRowDialog { wizard, status }
    }
}

#[component]
fn CompleteStep(wizard: Signal<ImportWizard>, status: Signal<String>) -> Element {
    let Some(summary) = wizard.read().completion() else {
        return rsx! { UploadStep { wizard, status } };
    };
    let imported = summary.imported;
    let skipped = summary.skipped;
    let source = summary.file_name.clone().unwrap_or_default();
    let finished_at = summary
        .committed_at
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_default();
    let mut wizard = wizard;
    let mut status = status;

    rsx! {
        section {
            style: "display: flex; flex-direction: column; gap: 12px; padding: 16px 0;",
            h2 { "Import complete" }
            p { "{imported} contacts imported from {source} at {finished_at}." }
            if skipped > 0 {
                p { style: "color: #b00020;", "{skipped} rows were skipped because they had problems." }
            }
            div {
                style: "display: flex; gap: 12px;",
                button {
                    style: BUTTON_STYLE,
                    onclick: move |_| {
                        wizard.write().import_more();
                        status.set("Ready for another file".to_string());
                    },
                    "Import more"
                }
                button {
                    style: PRIMARY_BUTTON_STYLE,
                    onclick: move |_| {
                        wizard.write().finish();
                        dioxus::desktop::window().close();
                    },
                    "Finish"
                }
            }
        }
    }
}

#[component]
pub fn App() -> Element {
    let config = use_hook(AppConfig::resolve);
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            return rsx! {
                div {
                    p { "Unable to load configuration: {err}" }
                }
            };
        }
    };

    let AppState {
        wizard,
        status,
        contacts,
    } = AppState::new(config);

    let step = {
        let current = wizard.read();
        match current.step() {
            WizardStep::Complete if current.completion().is_none() => WizardStep::Upload,
            step => step,
        }
    };
    let contact_count = contacts.len();
    let body = match step {
        WizardStep::Upload => rsx! { UploadStep { wizard, status } },
        WizardStep::Preview => rsx! { PreviewStep { wizard, status } },
        WizardStep::Complete => rsx! { CompleteStep { wizard, status } },
    };

    rsx! {
        div {
            style: "font-family: sans-serif; padding: 12px 20px;",
            StepHeader { step }
            {body}
            footer {
                style: "display: flex; justify-content: space-between; color: #555; border-top: 1px solid #ddd; padding-top: 8px;",
                span { "{status}" }
                span { "Contacts in list: {contact_count}" }
            }
        }
    }
}
