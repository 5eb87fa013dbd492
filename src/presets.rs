use std::collections::BTreeMap;

use anyhow::{bail, Result};
use facemorph_warp::SliderValues;

use crate::config::Config;

/// Presets that ship with the binary. Config presets with the same name win.
pub const BUILTIN_PRESETS: &[(&str, &[(&str, i32)])] = &[
    (
        "subtle",
        &[
            ("eyeSize", 8),
            ("eyeSpacing", 6),
            ("noseWidth", -6),
            ("mouthWidth", 5),
            ("jawline", 6),
            ("noiseLevel", 6),
        ],
    ),
    (
        "moderate",
        &[
            ("eyeSize", 18),
            ("eyeSpacing", 14),
            ("eyebrowHeight", 10),
            ("noseWidth", -14),
            ("noseLength", 10),
            ("mouthWidth", 12),
            ("faceWidth", -10),
            ("jawline", 14),
            ("noiseLevel", 12),
        ],
    ),
    (
        "strong",
        &[
            ("eyeSize", 35),
            ("eyeSpacing", 28),
            ("eyebrowHeight", 22),
            ("noseWidth", -30),
            ("noseLength", 24),
            ("mouthWidth", 26),
            ("mouthHeight", -18),
            ("faceWidth", -22),
            ("chinShape", 25),
            ("jawline", 30),
            ("noiseLevel", 20),
        ],
    ),
];

/// All preset names, built-in first, without duplicates.
pub fn preset_names(cfg: &Config) -> Vec<String> {
    let mut names: Vec<String> = BUILTIN_PRESETS.iter().map(|(n, _)| n.to_string()).collect();
    for name in cfg.presets.keys() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

fn lookup(cfg: &Config, name: &str) -> Option<Vec<(String, i32)>> {
    if let Some(map) = cfg.presets.get(name) {
        return Some(map.iter().map(|(k, v)| (k.clone(), *v)).collect());
    }
    BUILTIN_PRESETS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, pairs)| pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect())
}

/// Layer slider sources: defaults, config `[sliders]`, the preset, then
/// explicit overrides.
pub fn resolve_sliders(
    cfg: &Config,
    preset: Option<&str>,
    overrides: &[(String, i32)],
) -> Result<SliderValues> {
    let mut sliders = SliderValues::from(cfg.sliders.clone());
    if let Some(name) = preset {
        let Some(pairs) = lookup(cfg, name) else {
            bail!(
                "unknown preset {:?} (available: {})",
                name,
                preset_names(cfg).join(", ")
            );
        };
        sliders.apply_pairs(pairs.iter().map(|(k, v)| (k.as_str(), *v)));
    }
    sliders.apply_pairs(overrides.iter().map(|(k, v)| (k.as_str(), *v)));
    Ok(sliders)
}

/// Render a preset's non-default values as `key=value` pairs.
pub fn describe(cfg: &Config, name: &str) -> Option<String> {
    let pairs: BTreeMap<String, i32> = lookup(cfg, name)?.into_iter().collect();
    Some(
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use facemorph_warp::Slider;

    #[test]
    fn test_layering_order() {
        let mut cfg = Config::default();
        cfg.sliders.insert("eyeSize".into(), 5);
        cfg.sliders.insert("jawline".into(), 40);

        let s = resolve_sliders(&cfg, Some("subtle"), &[("jawline".into(), -3)]).unwrap();
        // preset overrides config, override wins last
        assert_eq!(s.get(Slider::EyeSize), 8);
        assert_eq!(s.get(Slider::Jawline), -3);
        assert_eq!(s.get(Slider::NoiseLevel), 6);
        assert_eq!(s.get(Slider::ChinShape), 0);
    }

    #[test]
    fn test_config_preset_shadows_builtin() {
        let mut cfg = Config::default();
        cfg.presets
            .insert("subtle".into(), BTreeMap::from([("mouthHeight".to_string(), 9)]));
        let s = resolve_sliders(&cfg, Some("subtle"), &[]).unwrap();
        assert_eq!(s.get(Slider::MouthHeight), 9);
        assert_eq!(s.get(Slider::EyeSize), 0);
        assert_eq!(preset_names(&cfg), vec!["subtle", "moderate", "strong"]);
    }

    #[test]
    fn test_unknown_preset() {
        let err = resolve_sliders(&Config::default(), Some("wild"), &[]).unwrap_err();
        assert!(err.to_string().contains("unknown preset"));
    }

    #[test]
    fn test_builtin_names_are_sliders() {
        for (_, pairs) in BUILTIN_PRESETS {
            for (key, _) in pairs.iter() {
                assert!(Slider::from_name(key).is_some(), "{}", key);
            }
        }
    }
}
