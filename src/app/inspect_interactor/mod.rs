// Inspect interactor - Dry-run report of the decisions for one filename

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

use crate::domain::model::*;
use crate::domain::rules::*;
use crate::planner::SubtitleLocator;

/// One subtitle asset the pipeline would look for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleCandidate {
    pub kind: SubtitleKind,
    pub path: PathBuf,
    pub exists: bool,
}

/// Everything the pipeline would decide for a filename, without touching it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectReport {
    pub filename: String,
    pub source: SourceTag,
    pub episode: Option<EpisodeId>,
    pub range: Option<EpisodeRange>,
    pub policy: Option<EpisodePolicy>,
    pub output_name: Option<String>,
    pub subtitles: Vec<SubtitleCandidate>,
}

impl InspectReport {
    /// Human-readable multi-line rendering
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            format!("File:        {}", self.filename),
            format!("Source:      {}", self.source),
        ];

        let Some(ep) = self.episode else {
            lines.push("Episode:     not recognized".to_string());
            return lines.join("\n");
        };
        lines.push(format!("Episode:     {}", ep));
        if let Some(range) = self.range {
            lines.push(format!("Range:       {}", range));
        }

        if let Some(policy) = &self.policy {
            let mode = match policy.skip {
                Some(reason) => format!("skip ({})", reason),
                None if policy.rename_only => "rename only".to_string(),
                None => "mux".to_string(),
            };
            lines.push(format!("Mode:        {}", mode));
            lines.push(format!("Keep subs:   {}", policy.keep_existing_subs));
            lines.push(format!("Relabel BB:  {}", policy.rename_existing_bb_track));
            lines.push(format!("Add fan:     {}", policy.add_fan_subs));
            lines.push(format!("Add BB:      {}", policy.add_bb_subs));
        }
        if let Some(name) = &self.output_name {
            lines.push(format!("Output:      {}", name));
        }
        for candidate in &self.subtitles {
            lines.push(format!(
                "{:<12} {} [{}]",
                format!("{} subs:", candidate.kind),
                candidate.path.display(),
                if candidate.exists { "found" } else { "missing" }
            ));
        }
        lines.join("\n")
    }
}

/// Interactor for the inspect use case
pub struct InspectInteractor {
    locator: SubtitleLocator,
    namer: OutputNamer,
    overrides: PolicyOverrides,
    skip_dubbed_episodes: bool,
    dubbed_episodes: BTreeSet<EpisodeId>,
}

impl InspectInteractor {
    pub fn new(locator: SubtitleLocator, namer: OutputNamer, overrides: PolicyOverrides) -> Self {
        Self {
            locator,
            namer,
            overrides,
            skip_dubbed_episodes: false,
            dubbed_episodes: BTreeSet::new(),
        }
    }

    /// Report dubbed episodes the way the pipeline treats them
    pub fn with_dubbed(
        mut self,
        skip_dubbed_episodes: bool,
        dubbed_episodes: BTreeSet<EpisodeId>,
    ) -> Self {
        self.skip_dubbed_episodes = skip_dubbed_episodes;
        self.dubbed_episodes = dubbed_episodes;
        self
    }

    /// Decide source, episode, policy, name and subtitle candidates
    pub fn inspect(&self, filename: &str) -> InspectReport {
        let source = SourceClassifier::classify(filename);
        let episode = SourceClassifier::extract_episode(filename);

        let mut report = InspectReport {
            filename: filename.to_string(),
            source,
            episode,
            range: None,
            policy: None,
            output_name: None,
            subtitles: Vec::new(),
        };

        let Some(ep) = episode else {
            return report;
        };

        let policy = EpisodePolicyResolver::apply_dubbed_override(
            EpisodePolicyResolver::resolve(ep, source, &self.overrides),
            ep,
            self.skip_dubbed_episodes,
            &self.dubbed_episodes,
        );
        report.range = Some(EpisodeRange::of(ep));
        report.output_name = Some(self.namer.output_name(ep, source, &policy));

        if !policy.is_rename_only() {
            for kind in [SubtitleKind::Fan, SubtitleKind::Bb] {
                if !policy.wants(kind) {
                    continue;
                }
                if let Some(path) = self.locator.candidate(ep, kind) {
                    report.subtitles.push(SubtitleCandidate {
                        kind,
                        exists: path.is_file(),
                        path,
                    });
                }
            }
        }

        report.policy = Some(policy);
        report
    }
}
