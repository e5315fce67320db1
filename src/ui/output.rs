//! Step and summary lines

use super::context::UiContext;
use console::{style, Style, StyledObject};

fn plain_step(tag: StyledObject<&str>, message: &str) {
    println!("  {} {}", tag, message);
}

/// Command banner
pub fn intro(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::intro(style(title).blue().bold()).ok();
    } else {
        println!("{}", style(title).blue().bold());
    }
}

pub fn outro_success(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).green().bold()).ok();
    } else {
        println!("{} {}", style("[OK]").green(), message);
    }
}

pub fn outro_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::outro(style(message).yellow().bold()).ok();
    } else {
        println!("{} {}", style("[WARN]").yellow(), message);
    }
}

/// Bold header before a group of key/value lines
pub fn section(ctx: &UiContext, title: &str) {
    println!();
    if ctx.use_fancy_output() {
        cliclack::log::info(style(title).bold()).ok();
    } else {
        println!("{}", style(title).bold());
    }
}

pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(message).ok();
    } else {
        plain_step(style("[OK]").green(), message);
    }
}

pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    let line = format!("{} ({})", message, style(detail).dim());
    if ctx.use_fancy_output() {
        cliclack::log::success(line).ok();
    } else {
        plain_step(style("[OK]").green(), &line);
    }
}

pub fn step_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(message).ok();
    } else {
        plain_step(style("[WARN]").yellow(), message);
    }
}

/// Warning followed by a dimmed next step
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    let line = format!("{} - {}", message, style(hint).dim());
    if ctx.use_fancy_output() {
        cliclack::log::warning(line).ok();
    } else {
        plain_step(style("[WARN]").yellow(), &line);
    }
}

pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::info(message).ok();
    } else {
        plain_step(style("[INFO]").cyan(), message);
    }
}

pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("  {}", style(message).dim());
    }
}

pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("  {}: {}", key, value);
    }
}

/// Key/value line colored green when `ok`, yellow otherwise
pub fn key_value_status(ctx: &UiContext, key: &str, value: &str, ok: bool) {
    let color = if ok {
        Style::new().green()
    } else {
        Style::new().yellow()
    };

    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), color.apply_to(value));
    } else {
        let prefix = if ok { "[OK]" } else { "[WARN]" };
        println!("  {} {}: {}", prefix, key, value);
    }
}
