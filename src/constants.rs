//! Application constants for the Tydex reader
//!
//! Section keywords, fixed-column layout defaults, and the verification
//! tolerance table used throughout the crate.

// =============================================================================
// Section Keywords
// =============================================================================

/// Prefix that introduces a section header line
pub const SECTION_PREFIX: &str = "**";

pub mod keywords {
    pub const HEADER: &str = "HEADER";
    pub const COMMENTS: &str = "COMMENTS";
    pub const CONSTANTS: &str = "CONSTANTS";
    pub const MEASURCHANNELS: &str = "MEASURCHANNELS";
    pub const MEASURDATA: &str = "MEASURDATA";
    pub const END: &str = "END";

    /// Every keyword the classifier accepts, in canonical file order
    pub const ALL: &[&str] = &[HEADER, COMMENTS, CONSTANTS, MEASURCHANNELS, MEASURDATA, END];
}

// =============================================================================
// Well-known Item Names
// =============================================================================

/// Header item holding the measurement date
pub const DATE_ITEM: &str = "DATE";

/// Header date formats seen in Tydex files, tried in order
pub const DATE_FORMATS: &[&str] = &["%d-%b-%Y", "%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

// =============================================================================
// Line Layout
// =============================================================================

/// Lines whose first non-blank character is this are comments
pub const DEFAULT_COMMENT_PREFIX: char = '!';

pub const DEFAULT_DECIMAL_SEPARATOR: char = '.';

/// Fixed-column widths for item lines: name, description, unit; value follows
pub const NAME_WIDTH: usize = 10;
pub const DESCRIPTION_WIDTH: usize = 30;
pub const UNIT_WIDTH: usize = 10;

/// Upper bound on the combined name, description and unit widths
pub const MAX_LAYOUT_WIDTH: usize = 1024;

// =============================================================================
// Constant Verification
// =============================================================================

/// Default tolerances for constant-vs-channel verification
pub mod tolerances {
    /// Vertical wheel load [N]
    pub const FZW: f64 = 100.0;
    /// Slip angle [deg]
    pub const SLIPANGL: f64 = 0.25;
    /// Inclination angle [deg]
    pub const INCLANGL: f64 = 1.6;
    /// Inflation pressure [Pa]
    pub const INFLPRES: f64 = 1000.0;

    pub const DEFAULTS: &[(&str, f64)] = &[
        ("FZW", FZW),
        ("SLIPANGL", SLIPANGL),
        ("INCLANGL", INCLANGL),
        ("INFLPRES", INFLPRES),
    ];
}

// =============================================================================
// File Discovery
// =============================================================================

/// Extension of Tydex data files
pub const TYDEX_EXTENSION: &str = "tdx";

/// Environment variable overriding the input encoding
pub const ENV_ENCODING: &str = "TYDEX_ENCODING";

/// Environment variable overriding the decimal separator
pub const ENV_DECIMAL_SEPARATOR: &str = "TYDEX_DECIMAL_SEPARATOR";

/// Config file name under the user config directory
pub const CONFIG_DIR_NAME: &str = "tydex";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_unique_and_uppercase() {
        for (i, keyword) in keywords::ALL.iter().enumerate() {
            assert!(keyword.chars().all(|c| c.is_ascii_uppercase()));
            assert!(!keywords::ALL[i + 1..].contains(keyword));
        }
    }

    #[test]
    fn test_default_tolerances_table() {
        assert_eq!(tolerances::DEFAULTS.len(), 4);
        assert!(tolerances::DEFAULTS.iter().all(|(_, tol)| *tol > 0.0));
    }
}
