//! Font loading for the report renderer.
//!
//! The brand family is downloaded into a scratch directory and embedded. When
//! that fails the document falls back to the PDF built-in Helvetica, which is
//! not embedded; `genpdf` still needs glyph metrics for layout, so those are
//! taken from a metric-compatible TrueType family found on disk.

use std::borrow::Cow;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use log::{info, warn};
use printpdf::BuiltinFont;

use crate::config::AssetConfig;
use crate::http::HttpClient;

/// Name of the downloaded brand family.
pub const BRAND_FONT_FAMILY_NAME: &str = "Poppins";

const BRAND_REGULAR_FILE: &str = "Poppins-Regular.ttf";
const BRAND_BOLD_FILE: &str = "Poppins-Bold.ttf";

/// Regular/bold file pairs usable as Helvetica metrics, in order of preference.
const FALLBACK_METRIC_FILES: &[(&str, &str)] = &[
    ("LiberationSans-Regular.ttf", "LiberationSans-Bold.ttf"),
    ("Arimo-Regular.ttf", "Arimo-Bold.ttf"),
    ("arial.ttf", "arialbd.ttf"),
    ("Arial.ttf", "Arial Bold.ttf"),
    ("DejaVuSans.ttf", "DejaVuSans-Bold.ttf"),
];

/// Metrics used when no candidate directory holds a usable pair.
const BUNDLED_REGULAR_METRICS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const BUNDLED_BOLD_METRICS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

const SYSTEM_FONT_DIRECTORIES: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/truetype/liberation2",
    "/usr/share/fonts/liberation-sans",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/truetype/croscore",
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
    "/Library/Fonts",
    "/System/Library/Fonts/Supplemental",
];

/// Which typeface the document was rendered with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Typeface {
    /// The downloaded brand family is embedded.
    Brand,
    /// The built-in Helvetica is used because the brand family was unavailable.
    Builtin { reason: String },
}

impl Typeface {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Typeface::Builtin { .. })
    }
}

/// Downloads the brand fonts into `scratch_dir` and loads them as a family.
pub fn load_brand_family(
    client: &HttpClient,
    assets: &AssetConfig,
    scratch_dir: &Path,
) -> Result<FontFamily<FontData>, String> {
    let regular = download_font(
        client,
        "INV_POPPINS_REG_URL",
        assets.font_regular_url.as_deref(),
        &scratch_dir.join(BRAND_REGULAR_FILE),
    )?;
    let bold = download_font(
        client,
        "INV_POPPINS_BOLD_URL",
        assets.font_bold_url.as_deref(),
        &scratch_dir.join(BRAND_BOLD_FILE),
    )?;

    Ok(FontFamily {
        italic: regular.clone(),
        bold_italic: bold.clone(),
        regular,
        bold,
    })
}

fn download_font(
    client: &HttpClient,
    setting: &'static str,
    url: Option<&str>,
    path: &Path,
) -> Result<FontData, String> {
    let bytes = client.fetch_asset(setting, url).map_err(|err| error_chain(&err))?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("cannot create {}: {}", parent.display(), err))?;
    }
    fs::write(path, &bytes).map_err(|err| format!("cannot write {}: {}", path.display(), err))?;
    FontData::load(path, None).map_err(|err| format!("cannot load {}: {}", path.display(), err))
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn env_path(var: &str) -> Option<PathBuf> {
    env::var_os(var).and_then(|value| {
        let path = PathBuf::from(value);
        if path.as_os_str().is_empty() {
            None
        } else {
            Some(path)
        }
    })
}

fn fallback_directory_candidates(extra: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = extra {
        candidates.push(path.to_path_buf());
    }

    let manifest_candidate = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
    candidates.push(manifest_candidate);

    candidates.extend(SYSTEM_FONT_DIRECTORIES.iter().map(PathBuf::from));

    for var in ["WINDIR", "SystemRoot"] {
        if let Some(root) = env_path(var) {
            candidates.push(root.join("Fonts"));
        }
    }

    candidates.dedup();
    candidates
}

fn load_builtin(path: &Path, builtin: BuiltinFont) -> Result<FontData, Error> {
    FontData::load(path, Some(builtin))
}

/// Returns the built-in Helvetica family with metrics from the first usable
/// candidate directory, or from the bundled DejaVu Sans files when none is found.
pub fn builtin_font_family(extra_dir: Option<&Path>) -> Result<FontFamily<FontData>, Error> {
    let mut attempts = Vec::new();

    for directory in fallback_directory_candidates(extra_dir) {
        if !directory.is_dir() {
            continue;
        }
        for (regular_file, bold_file) in FALLBACK_METRIC_FILES {
            let regular_path = directory.join(regular_file);
            let bold_path = directory.join(bold_file);
            if !regular_path.is_file() || !bold_path.is_file() {
                continue;
            }

            match (
                load_builtin(&regular_path, BuiltinFont::Helvetica),
                load_builtin(&bold_path, BuiltinFont::HelveticaBold),
            ) {
                (Ok(regular), Ok(bold)) => {
                    info!("using Helvetica with metrics from {}", regular_path.display());
                    let italic = load_builtin(&regular_path, BuiltinFont::HelveticaOblique)?;
                    let bold_italic = load_builtin(&bold_path, BuiltinFont::HelveticaBoldOblique)?;
                    return Ok(FontFamily {
                        regular,
                        bold,
                        italic,
                        bold_italic,
                    });
                }
                (Err(err), _) | (_, Err(err)) => {
                    attempts.push(format!("{} ({})", directory.display(), err));
                }
            }
        }
    }

    if !attempts.is_empty() {
        warn!("unusable fallback metrics: {}", attempts.join(", "));
    }
    info!("using Helvetica with bundled metrics");
    bundled_builtin_family()
}

fn bundled_builtin_family() -> Result<FontFamily<FontData>, Error> {
    let metrics = |data: &[u8], builtin| FontData::new(data.to_vec(), Some(builtin));
    Ok(FontFamily {
        regular: metrics(BUNDLED_REGULAR_METRICS, BuiltinFont::Helvetica)?,
        bold: metrics(BUNDLED_BOLD_METRICS, BuiltinFont::HelveticaBold)?,
        italic: metrics(BUNDLED_REGULAR_METRICS, BuiltinFont::HelveticaOblique)?,
        bold_italic: metrics(BUNDLED_BOLD_METRICS, BuiltinFont::HelveticaBoldOblique)?,
    })
}

/// Rewrites `text` so every character can be printed with a built-in font.
///
/// Built-in fonts only cover Windows-1252. Common typographic characters
/// outside it get an ASCII stand-in, anything else becomes `?`.
pub fn builtin_safe_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_windows_1252) {
        return Cow::Borrowed(text);
    }

    let mut safe = String::with_capacity(text.len());
    for ch in text.chars() {
        if is_windows_1252(ch) {
            safe.push(ch);
            continue;
        }
        safe.push_str(match ch {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2212}' | '\u{2043}' => "-",
            '\u{2192}' | '\u{21D2}' => "->",
            '\u{2190}' | '\u{21D0}' => "<-",
            '\u{2191}' => "^",
            '\u{2193}' => "v",
            '\u{2264}' => "<=",
            '\u{2265}' => ">=",
            '\u{2248}' => "~",
            '\u{2260}' => "!=",
            '\n' | '\r' | '\t' => " ",
            '\u{2002}' | '\u{2003}' | '\u{2007}' | '\u{2009}' | '\u{200A}' | '\u{202F}' => " ",
            '\u{200B}' | '\u{200D}' | '\u{FEFF}' => "",
            '\u{2032}' => "'",
            '\u{2033}' => "\"",
            '\u{2219}' | '\u{22C5}' => "\u{00B7}",
            _ => "?",
        });
    }
    Cow::Owned(safe)
}

fn is_windows_1252(ch: char) -> bool {
    let mut buffer = [0; 4];
    let encoded = ch.encode_utf8(&mut buffer);
    lopdf::Document::encode_text(Some("WinAnsiEncoding"), encoded).len() == 1
}

/// Loads the brand family, falling back to the built-in family on any failure.
pub fn resolve_font_family(
    client: &HttpClient,
    assets: &AssetConfig,
    scratch_dir: &Path,
    fallback_dir: Option<&Path>,
) -> Result<(FontFamily<FontData>, Typeface), Error> {
    match load_brand_family(client, assets, scratch_dir) {
        Ok(family) => {
            info!("registered {} font family", BRAND_FONT_FAMILY_NAME);
            Ok((family, Typeface::Brand))
        }
        Err(reason) => {
            warn!(
                "{} not loaded ({}); falling back to Helvetica",
                BRAND_FONT_FAMILY_NAME, reason
            );
            let family = builtin_font_family(fallback_dir)?;
            Ok((family, Typeface::Builtin { reason }))
        }
    }
}
