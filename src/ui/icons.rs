//! Shared UI icons.
//!
//! Each icon has a plain-text fallback for terminals without emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");

// Round-trip indicators
pub static DOCUMENT: Emoji<'_, '_> = Emoji("📄 ", "");
pub static INBOX: Emoji<'_, '_> = Emoji("📥 ", "");
