use crawl_core::{parse_filters, AppViewModel, Phase, RenderModel};

const BAR_WIDTH: usize = 30;

pub fn render(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    match view.phase {
        Phase::Idle => render_form(view, &mut lines),
        Phase::Submitting => {
            lines.push("Submitting crawl request...".to_string());
            render_cancel_hint(view, "`cancel`", &mut lines);
        }
        Phase::Polling => {
            match &view.progress {
                Some(progress) => render_progress(progress, &mut lines),
                None => lines.push(format!("Job {} accepted, waiting for status...", job(view))),
            }
            render_cancel_hint(view, "`cancel`", &mut lines);
        }
        Phase::Completed => {
            if let Some(progress) = &view.progress {
                render_progress(progress, &mut lines);
            }
            render_exports(view, &mut lines);
        }
        Phase::Failed => {
            if let Some(progress) = &view.progress {
                render_progress(progress, &mut lines);
            }
            if let Some(message) = &view.failure_message {
                lines.push(format!("!! {message}"));
            }
            render_cancel_hint(view, "`cancel` or `new`", &mut lines);
        }
    }
    lines
}

pub fn render_alert(message: &str) -> Vec<String> {
    vec![String::new(), format!("!! {message}"), String::new()]
}

fn render_form(view: &AppViewModel, lines: &mut Vec<String>) {
    let form = &view.form;
    let rules = parse_filters(&form.filters);
    lines.push("New crawl".to_string());
    lines.push(format!(
        "  url:     {}",
        if form.url.is_empty() { "-" } else { form.url.as_str() }
    ));
    lines.push(format!("  depth:   {}", form.depth));
    lines.push(format!("  filters: {}", rules.len()));
    for rule in &rules {
        lines.push(format!("    {} ... {}", rule.start, rule.end));
    }
    if view.can_submit {
        lines.push("Type `submit` when ready, `help` for commands.".to_string());
    }
}

fn render_cancel_hint(view: &AppViewModel, commands: &str, lines: &mut Vec<String>) {
    if view.can_cancel {
        lines.push(format!("[{}] with {commands}", view.cancel_label));
    }
}

fn render_progress(progress: &RenderModel, lines: &mut Vec<String>) {
    let filled = BAR_WIDTH * progress.progress_percent as usize / 100;
    lines.push(format!(
        "[{}{}] {:>3}%  {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress.progress_percent,
        progress.status_label
    ));
    if let Some(activity) = &progress.activity_line {
        lines.push(format!("  {activity}"));
    }
    lines.push(format!(
        "  pages: {}/{}  current: {}",
        progress.pages_downloaded, progress.total_pages, progress.current_url
    ));
    if !progress.errors.is_empty() {
        lines.push(format!("  errors ({}):", progress.errors.len()));
        for error in &progress.errors {
            lines.push(format!("    - {error}"));
        }
    }
}

fn render_exports(view: &AppViewModel, lines: &mut Vec<String>) {
    lines.push(format!("Job {} finished. Exports:", job(view)));
    if !view.can_export {
        return;
    }
    match view.archive_downloads {
        0 => lines.push("  zip  download archive".to_string()),
        n => lines.push(format!("  zip  download archive ({n} downloading)")),
    }
    if view.document_export_busy {
        lines.push("  pdf  generating PDF...".to_string());
    } else if view.can_export_document {
        lines.push("  pdf  generate PDF".to_string());
    }
    if let Some(document) = &view.last_document {
        lines.push(format!("  saved {document}"));
    }
    lines.push("Type `new` for another crawl.".to_string());
}

fn job(view: &AppViewModel) -> String {
    view.job_id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string())
}
