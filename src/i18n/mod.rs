use std::path::Path;

use fluent_bundle::{FluentArgs, FluentBundle, FluentResource};
use unic_langid::LanguageIdentifier;

use crate::game::types::{Move, Participant, RoundOutcome};

const EMBEDDED_EN: &str = include_str!("../../resources/en.ftl");
const EMBEDDED_DE: &str = include_str!("../../resources/de.ftl");

/// Fluent-based message catalogue for round and match results.
pub struct I18n {
    bundle: FluentBundle<FluentResource>,
    lang: String,
}

/// `de` for German locales, `en` for everything else. Without a request the
/// system locale decides.
pub fn resolve_language(requested: Option<&str>) -> &'static str {
    let lang = requested
        .map(str::to_string)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| "en".to_string())
        .to_lowercase();
    if lang.starts_with("de") {
        "de"
    } else {
        "en"
    }
}

impl I18n {
    /// The built-in catalogue.
    pub fn embedded(requested: Option<&str>) -> Self {
        let lang = resolve_language(requested);
        let source = if lang == "de" { EMBEDDED_DE } else { EMBEDDED_EN };
        Self::from_source(lang, source.to_string())
            .or_else(|| Self::from_source("en", EMBEDDED_EN.to_string()))
            .unwrap_or_else(Self::empty)
    }

    /// Load `<lang>.ftl` from `dir`, falling back to English and then to the
    /// built-in catalogue.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P, requested: Option<&str>) -> Self {
        let dir = dir.as_ref();
        let lang = resolve_language(requested);

        if let Some(i18n) = Self::try_load(dir, lang) {
            return i18n;
        }
        if lang != "en" {
            if let Some(i18n) = Self::try_load(dir, "en") {
                return i18n;
            }
        }
        log::debug!("no catalogue in {}, using built-in messages", dir.display());
        Self::embedded(requested)
    }

    fn try_load(dir: &Path, lang: &str) -> Option<Self> {
        let path = dir.join(format!("{}.ftl", lang));
        let source = std::fs::read_to_string(&path).ok()?;
        Self::from_source(lang, source)
    }

    fn from_source(lang: &str, source: String) -> Option<Self> {
        let resource = FluentResource::try_new(source).ok()?;
        let langid: LanguageIdentifier = lang.parse().ok()?;
        let mut bundle = FluentBundle::new(vec![langid]);
        bundle.set_use_isolating(false);
        bundle.add_resource(resource).ok()?;
        Some(Self {
            bundle,
            lang: lang.to_string(),
        })
    }

    fn empty() -> Self {
        Self {
            bundle: FluentBundle::new(vec![LanguageIdentifier::default()]),
            lang: "en".to_string(),
        }
    }

    /// Get a translated message by its identifier.
    pub fn t(&self, id: &str) -> String {
        self.format(id, None)
    }

    /// Get a translated message with arguments.
    pub fn t_args(&self, id: &str, args: &FluentArgs) -> String {
        self.format(id, Some(args))
    }

    fn format(&self, id: &str, args: Option<&FluentArgs>) -> String {
        let msg = match self.bundle.get_message(id) {
            Some(m) => m,
            None => return id.to_string(),
        };
        let pattern = match msg.value() {
            Some(p) => p,
            None => return id.to_string(),
        };
        let mut errors = vec![];
        self.bundle
            .format_pattern(pattern, args, &mut errors)
            .to_string()
    }

    pub fn current_language(&self) -> &str {
        &self.lang
    }

    pub fn move_name(&self, mv: Move) -> String {
        self.t(&format!("move-{}", mv))
    }

    pub fn round_outcome(&self, outcome: RoundOutcome) -> String {
        match outcome {
            RoundOutcome::Win(Participant::Player) => self.t("round-win-player"),
            RoundOutcome::Win(Participant::Computer) => self.t("round-win-computer"),
            RoundOutcome::Tie => self.t("round-tie"),
            RoundOutcome::Invalid => self.t("round-invalid"),
        }
    }

    pub fn match_winner(&self, winner: Participant) -> String {
        match winner {
            Participant::Player => self.t("match-won-player"),
            Participant::Computer => self.t("match-won-computer"),
        }
    }

    /// A `<player> / <computer>` status line such as `status-health`.
    pub fn versus(&self, id: &str, player: u32, computer: u32) -> String {
        let mut args = FluentArgs::new();
        args.set("player", player);
        args.set("computer", computer);
        self.t_args(id, &args)
    }
}
