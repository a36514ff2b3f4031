//! Build script for phsense-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates probe.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths and arguments
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x in OUT_DIR");
    f.write_all(memory_x).expect("write memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate probe.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=probe.toml");

    let config_path = Path::new("probe.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: probe.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds probe.toml as its configuration.            ║\n\
            ║  Please create one in the phsense-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read probe.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in probe.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_probe(&config, &mut errors);
    validate_adc(&config, &mut errors);
    validate_health(&config, &mut errors);
    validate_buffers(&config, &mut errors);
    validate_calibration(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid configuration in probe.toml", &errors);
    }

    println!("cargo:warning=probe.toml validated successfully");
}

/// Abort the build with a boxed error listing
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|line| {
                let truncated = if line.len() > 62 {
                    format!("{}...", &line[..59])
                } else {
                    line.clone()
                };
                format!("║  • {:<62} ║", truncated)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    const KNOWN: &[&str] = &["probe", "adc", "health", "buffers", "calibration"];

    let Some(table) = config.as_table() else {
        return;
    };
    for (name, value) in table {
        if !KNOWN.contains(&name.as_str()) {
            errors.push(format!("unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("[{}] must be a table", name));
        }
    }
}

/// Numeric value of `section.key`, accepting integers and floats
fn number(config: &toml::Value, section: &str, key: &str) -> Option<f64> {
    match config.get(section)?.get(key)? {
        toml::Value::Integer(i) => Some(*i as f64),
        toml::Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn has_key(config: &toml::Value, section: &str, key: &str) -> bool {
    config.get(section).and_then(|s| s.get(key)).is_some()
}

fn validate_probe(config: &toml::Value, errors: &mut Vec<String>) {
    if has_key(config, "probe", "pin") {
        match config.get("probe").and_then(|p| p.get("pin")) {
            Some(toml::Value::Integer(pin)) if (26..=29).contains(pin) => {}
            _ => errors.push("[probe] pin must be an ADC pin (26-29)".to_string()),
        }
    }
    if has_key(config, "probe", "report_interval_ms") {
        match config.get("probe").and_then(|p| p.get("report_interval_ms")) {
            Some(toml::Value::Integer(ms)) if *ms > 0 => {}
            _ => errors.push("[probe] report_interval_ms must be a positive integer".to_string()),
        }
    }
}

fn validate_adc(config: &toml::Value, errors: &mut Vec<String>) {
    if has_key(config, "adc", "vref") && !number(config, "adc", "vref").is_some_and(|v| v > 0.0) {
        errors.push("[adc] vref must be a positive number".to_string());
    }
    for key in ["adc_max", "sample_count"] {
        if has_key(config, "adc", key) {
            match config.get("adc").and_then(|a| a.get(key)) {
                Some(toml::Value::Integer(n)) if *n > 0 => {}
                _ => errors.push(format!("[adc] {} must be a positive integer", key)),
            }
        }
    }
    if let Some(toml::Value::Integer(n)) = config.get("adc").and_then(|a| a.get("sample_count")) {
        if *n > 255 {
            errors.push("[adc] sample_count must be at most 255".to_string());
        }
    }
}

fn validate_health(config: &toml::Value, errors: &mut Vec<String>) {
    let low = number(config, "health", "low_v").unwrap_or(0.05);
    let high = number(config, "health", "high_v").unwrap_or(3.25);
    if low >= high {
        errors.push("[health] low_v must be below high_v".to_string());
    }
}

fn validate_buffers(config: &toml::Value, errors: &mut Vec<String>) {
    // Preset values, then per-key overrides, as the firmware parser applies them
    let mut phs = [4.0, 7.0, 9.0];
    if let Some(preset) = config.get("buffers").and_then(|b| b.get("preset")) {
        match preset.as_str() {
            Some("standard") => {}
            Some("nist") => phs = [4.01, 6.86, 9.18],
            _ => errors.push("[buffers] preset must be 'standard' or 'nist'".to_string()),
        }
    }

    let keys = ["low", "mid", "high"];
    for (i, key) in keys.iter().enumerate() {
        if has_key(config, "buffers", key) {
            match number(config, "buffers", key) {
                Some(ph) => phs[i] = ph,
                None => errors.push(format!("[buffers] {} must be a number", key)),
            }
        }
        if !(0.0..=14.0).contains(&phs[i]) {
            errors.push(format!("[buffers] {} must be a pH between 0 and 14", key));
        }
    }

    for (i, j) in [(0, 1), (0, 2), (1, 2)] {
        if phs[i] == phs[j] {
            errors.push(format!("[buffers] {} and {} must differ", keys[i], keys[j]));
        }
    }
}

fn validate_calibration(config: &toml::Value, errors: &mut Vec<String>) {
    if number(config, "calibration", "slope") == Some(0.0) {
        errors.push("[calibration] slope must be non-zero".to_string());
    }
}
