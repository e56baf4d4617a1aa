//! Voice profile catalog.
//!
//! Each profile maps a selector to a fixed chain of ffmpeg audio filters. The
//! chains are hand-tuned content and must be kept exactly as declared here.

use lazy_static::lazy_static;
use serde::Serialize;

/// A single filter parameter, either `key=value` or a bare positional value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageParam {
    Named(&'static str, &'static str),
    Positional(&'static str),
}

impl StageParam {
    fn render(&self) -> String {
        match self {
            StageParam::Named(key, value) => format!("{}={}", key, value),
            StageParam::Positional(value) => value.to_string(),
        }
    }
}

/// One stage of an effect chain, e.g. `highpass=f=80`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectStage {
    pub name: &'static str,
    pub params: Vec<StageParam>,
}

impl EffectStage {
    fn new(name: &'static str, params: Vec<StageParam>) -> Self {
        Self { name, params }
    }

    /// Value of a named parameter, if this stage declares it.
    pub fn param(&self, key: &str) -> Option<&'static str> {
        self.params.iter().find_map(|p| match p {
            StageParam::Named(k, v) if *k == key => Some(*v),
            _ => None,
        })
    }

    pub fn render(&self) -> String {
        if self.params.is_empty() {
            return self.name.to_string();
        }
        let params: Vec<String> = self.params.iter().map(StageParam::render).collect();
        format!("{}={}", self.name, params.join(":"))
    }
}

/// Ordered list of effect stages. Order is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectChain {
    stages: Vec<EffectStage>,
}

impl EffectChain {
    pub fn stages(&self) -> &[EffectStage] {
        &self.stages
    }

    /// Renders the chain as a single ffmpeg filter graph argument.
    pub fn to_filter_graph(&self) -> String {
        self.stages
            .iter()
            .map(EffectStage::render)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug)]
pub struct FilterProfile {
    pub selector: &'static str,
    pub description: &'static str,
    pub chain: EffectChain,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub selector: &'static str,
    pub description: &'static str,
}

/// Read-only, process-wide catalog of voice profiles.
#[derive(Debug)]
pub struct FilterCatalog {
    profiles: Vec<FilterProfile>,
}

lazy_static! {
    static ref CATALOG: FilterCatalog = FilterCatalog::builtin();
}

impl FilterCatalog {
    pub fn global() -> &'static FilterCatalog {
        &CATALOG
    }

    /// Returns the chain for `selector`, or `None` for undeclared selectors.
    pub fn resolve(&self, selector: &str) -> Option<&EffectChain> {
        self.profiles
            .iter()
            .find(|p| p.selector == selector)
            .map(|p| &p.chain)
    }

    pub fn profiles(&self) -> impl Iterator<Item = &FilterProfile> {
        self.profiles.iter()
    }

    pub fn summaries(&self) -> Vec<ProfileSummary> {
        self.profiles()
            .map(|p| ProfileSummary {
                selector: p.selector,
                description: p.description,
            })
            .collect()
    }

    fn builtin() -> Self {
        use StageParam::{Named as N, Positional as P};

        let loudnorm = || {
            EffectStage::new(
                "loudnorm",
                vec![N("I", "-16"), N("TP", "-1.5"), N("LRA", "11")],
            )
        };
        let highpass = |f| EffectStage::new("highpass", vec![N("f", f)]);
        let lowpass = |f| EffectStage::new("lowpass", vec![N("f", f)]);
        let compressor = |threshold, ratio, release| {
            EffectStage::new(
                "acompressor",
                vec![
                    N("threshold", threshold),
                    N("ratio", ratio),
                    N("attack", "5"),
                    N("release", release),
                ],
            )
        };
        let pitch = |p| EffectStage::new("rubberband", vec![N("pitch", p)]);
        let equalizer = |f, w, g| {
            EffectStage::new(
                "equalizer",
                vec![N("f", f), N("t", "q"), N("w", w), N("g", g)],
            )
        };

        let profiles = vec![
            FilterProfile {
                selector: "1",
                description: "High-pitched robotic voice",
                chain: EffectChain {
                    stages: vec![
                        loudnorm(),
                        highpass("80"),
                        lowpass("12000"),
                        compressor("-20dB", "4", "50"),
                        pitch("1.3348"),
                        highpass("200"),
                        equalizer("2500", "1.5", "5"),
                        equalizer("6000", "1", "3"),
                        EffectStage::new(
                            "chorus",
                            vec![P("0.6"), P("0.9"), P("50"), P("0.4"), P("0.25"), P("2")],
                        ),
                    ],
                },
            },
            FilterProfile {
                selector: "2",
                description: "Thin, chipmunk-like voice",
                chain: EffectChain {
                    stages: vec![
                        loudnorm(),
                        highpass("80"),
                        lowpass("12000"),
                        compressor("-18dB", "3", "50"),
                        pitch("1.2599"),
                        highpass("250"),
                        equalizer("3000", "1.5", "6"),
                        equalizer("7000", "1", "4"),
                        equalizer("9000", "2", "-3"),
                    ],
                },
            },
            FilterProfile {
                selector: "3",
                description: "Deep, mysterious voice",
                chain: EffectChain {
                    stages: vec![
                        loudnorm(),
                        highpass("60"),
                        lowpass("12000"),
                        compressor("-22dB", "6", "100"),
                        pitch("0.7492"),
                        equalizer("100", "1", "4"),
                        equalizer("300", "1.5", "5"),
                        equalizer("1800", "2", "-5"),
                        lowpass("4500"),
                        EffectStage::new("aecho", vec![P("0.8"), P("0.9"), P("40"), P("0.3")]),
                    ],
                },
            },
            FilterProfile {
                selector: "4",
                description: "Muffled, distant voice",
                chain: EffectChain {
                    stages: vec![
                        loudnorm(),
                        highpass("80"),
                        compressor("-20dB", "4", "50"),
                        pitch("0.8909"),
                        highpass("400"),
                        lowpass("3400"),
                        equalizer("1200", "1.5", "4"),
                        EffectStage::new("overdrive", vec![N("gain", "2"), N("colour", "5")]),
                        EffectStage::new(
                            "alimiter",
                            vec![N("limit", "0.8"), N("attack", "5"), N("release", "50")],
                        ),
                    ],
                },
            },
        ];

        Self { profiles }
    }
}
