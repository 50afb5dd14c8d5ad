// Domain rules - Classification, episode policy and naming decisions

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// Filename test identifying one release family
#[derive(Debug, Clone, Copy)]
pub enum Marker {
    /// Every fragment must appear in the filename
    All(&'static [&'static str]),
    /// At least one fragment must appear in the filename
    Any(&'static [&'static str]),
}

impl Marker {
    pub fn matches(&self, filename: &str) -> bool {
        match self {
            Marker::All(fragments) => fragments.iter().all(|f| filename.contains(f)),
            Marker::Any(fragments) => fragments.iter().any(|f| filename.contains(f)),
        }
    }
}

/// Source classification rules, first match wins.
///
/// `FabreRemastered` must stay ahead of `Fabre`: the plain marker is a
/// prefix of the remastered one.
pub const SOURCE_RULES: &[(Marker, SourceTag)] = &[
    (
        Marker::All(&["[Erai-raws] Detective Conan -", "[Multiple Subtitle]"]),
        SourceTag::EraiRaws,
    ),
    (Marker::All(&["[RAW Reghost-Fabre]"]), SourceTag::ReghostFabre),
    (Marker::All(&["[Crunchyroll]"]), SourceTag::Crunchyroll),
    (
        Marker::All(&["[Fabre-RAW] Detective Conan Remastered"]),
        SourceTag::FabreRemastered,
    ),
    (Marker::All(&["[Fabre-RAW] Detective Conan"]), SourceTag::Fabre),
    (Marker::Any(&["Bilibili", "bilibili"]), SourceTag::Bilibili),
];

/// One episode-number extraction rule
#[derive(Debug)]
pub struct EpisodePattern {
    pub label: &'static str,
    pub regex: Regex,
}

/// Episode-number extraction rules, most format-specific first
pub static EPISODE_PATTERNS: Lazy<Vec<EpisodePattern>> = Lazy::new(|| {
    [
        (
            "erai_raws",
            r"\[Erai-raws\] Detective Conan - (\d{4}) \[1080p\]\[Multiple Subtitle\]",
        ),
        ("reghost_fabre", r"\[RAW Reghost-Fabre\] Detective Conan (\d{1,4})"),
        ("crunchyroll", r"\[Crunchyroll\] Detective Conan - (\d{1,4}) \[Multi-Sub\]"),
        ("fabre_remastered", r"\[Fabre-RAW\] Detective Conan Remastered (\d{4})"),
        ("fabre", r"\[Fabre-RAW\] Detective Conan (\d{4})"),
        ("erai_raws_loose", r"\[Erai-raws\] Detective Conan - (\d{4})"),
        ("generic", r"Detective Conan (\d{4})"),
    ]
    .into_iter()
    .map(|(label, pattern)| EpisodePattern {
        label,
        regex: Regex::new(pattern).expect("episode pattern is a valid regex"),
    })
    .collect()
});

/// Filename classification
pub struct SourceClassifier;

impl SourceClassifier {
    /// Classify a filename into its release family, `Unknown` as fallback
    pub fn classify(filename: &str) -> SourceTag {
        SOURCE_RULES
            .iter()
            .find(|(marker, _)| marker.matches(filename))
            .map(|(_, tag)| *tag)
            .unwrap_or(SourceTag::Unknown)
    }

    /// Extract the episode number, if any rule matches.
    ///
    /// A match whose number lies outside the series is ignored and the
    /// next rule is tried.
    pub fn extract_episode(filename: &str) -> Option<EpisodeId> {
        EPISODE_PATTERNS.iter().find_map(|pattern| {
            let digits = pattern.regex.captures(filename)?.get(1)?.as_str();
            let episode = digits.parse::<u32>().ok().and_then(|n| EpisodeId::new(n).ok());
            if episode.is_some() {
                trace!(rule = pattern.label, filename, "episode pattern matched");
            }
            episode
        })
    }

    /// Like [`Self::extract_episode`], but an unrecognized name is an error
    pub fn require_episode(filename: &str) -> Result<EpisodeId, DomainError> {
        Self::extract_episode(filename)
            .ok_or_else(|| DomainError::ClassificationAmbiguous(filename.to_string()))
    }
}

/// Per-range replacements for the default policies
pub type PolicyOverrides = BTreeMap<EpisodeRange, EpisodePolicy>;

/// Decision table mapping (episode, source) to an [`EpisodePolicy`]
pub struct EpisodePolicyResolver;

impl EpisodePolicyResolver {
    /// Erai-raws releases in this range already carry acceptable subtitles
    pub const ERAI_RENAME_ONLY: RangeInclusive<u16> = 1..=123;

    /// Embedded track here is the BB translation under a wrong label
    pub const BB_TRACK_RELABEL: RangeInclusive<u16> = 724..=753;

    /// Hardcoded base policy for a range
    pub fn default_policy(range: EpisodeRange) -> EpisodePolicy {
        match range {
            EpisodeRange::Early => EpisodePolicy::mux(true, true, false),
            // External BB subs supersede whatever is embedded in this band.
            EpisodeRange::Middle => EpisodePolicy::mux(false, true, true),
            EpisodeRange::Late => EpisodePolicy::mux(true, true, false),
        }
    }

    /// Resolve the policy for one episode. Pure; first matching rule wins.
    pub fn resolve(ep: EpisodeId, source: SourceTag, overrides: &PolicyOverrides) -> EpisodePolicy {
        if source == SourceTag::Bilibili {
            return EpisodePolicy::skipped(SkipReason::EmbeddedSubs);
        }

        if source == SourceTag::EraiRaws && ep.within(&Self::ERAI_RENAME_ONLY) {
            return EpisodePolicy::rename_only(OutputFormat::Remastered);
        }

        let range = EpisodeRange::of(ep);
        let mut policy = overrides
            .get(&range)
            .cloned()
            .unwrap_or_else(|| Self::default_policy(range));
        policy.skip = None;

        if ep.within(&Self::BB_TRACK_RELABEL) {
            policy.rename_existing_bb_track = true;
        }

        policy
    }

    /// Replace `policy` with a rename-only skip when the operator opted out
    /// of processing dubbed episodes and `ep` is one of them.
    pub fn apply_dubbed_override(
        policy: EpisodePolicy,
        ep: EpisodeId,
        skip_dubbed: bool,
        dubbed: &BTreeSet<EpisodeId>,
    ) -> EpisodePolicy {
        if skip_dubbed && dubbed.contains(&ep) {
            EpisodePolicy::skipped(SkipReason::Dubbed)
        } else {
            policy
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Rendition {
    Remastered1080,
    Sd480,
}

/// Canonical output filenames
#[derive(Debug, Clone)]
pub struct OutputNamer {
    series_name: String,
    extension: String,
}

impl Default for OutputNamer {
    fn default() -> Self {
        Self::new("Detective Conan", "mkv")
    }
}

impl OutputNamer {
    pub fn new(series_name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            series_name: series_name.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Episode number of a file that already carries a canonical output
    /// name, in either rendition
    pub fn archived_episode(&self, filename: &str) -> Option<EpisodeId> {
        let stem = filename
            .strip_prefix(self.series_name.as_str())?
            .strip_prefix(' ')?
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        let digits = stem
            .strip_prefix("Remastered ")
            .and_then(|rest| rest.strip_suffix(" [1080p]"))
            .or_else(|| stem.strip_suffix(" [480p]"))?;

        if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        EpisodeId::new(digits.parse().ok()?).ok()
    }

    /// Output filename; an explicit policy format beats the source default
    pub fn output_name(&self, ep: EpisodeId, source: SourceTag, policy: &EpisodePolicy) -> String {
        let rendition = match policy.output_format {
            OutputFormat::Remastered => Rendition::Remastered1080,
            OutputFormat::Sd480 => Rendition::Sd480,
            OutputFormat::Default if source == SourceTag::ReghostFabre => Rendition::Sd480,
            OutputFormat::Default => Rendition::Remastered1080,
        };

        match rendition {
            Rendition::Remastered1080 => format!(
                "{} Remastered {} [1080p].{}",
                self.series_name,
                ep.padded(),
                self.extension
            ),
            Rendition::Sd480 => format!(
                "{} {} [480p].{}",
                self.series_name,
                ep.padded(),
                self.extension
            ),
        }
    }
}
