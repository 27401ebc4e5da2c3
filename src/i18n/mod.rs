use fluent_bundle::{FluentArgs, FluentBundle, FluentResource};
use unic_langid::LanguageIdentifier;

const RESOURCES: [(&str, &str); 2] = [
    ("en", include_str!("../../resources/en.ftl")),
    ("de", include_str!("../../resources/de.ftl")),
];

/// Fluent-based internationalization for console notices.
pub struct I18n {
    bundle: FluentBundle<FluentResource>,
    lang: String,
}

impl I18n {
    /// Load the requested language, or auto-detect the system language when `None`.
    pub fn load(requested: Option<&str>) -> Self {
        let wanted = requested
            .map(str::to_string)
            .or_else(sys_locale::get_locale)
            .unwrap_or_else(|| "en".to_string())
            .to_lowercase();
        let lang_code = if wanted.starts_with("de") { "de" } else { "en" };

        if let Some(i18n) = Self::try_load(lang_code).or_else(|| Self::try_load("en")) {
            return i18n;
        }
        // Bundled resources failed to parse: every lookup echoes its id.
        Self {
            bundle: FluentBundle::new(vec![LanguageIdentifier::default()]),
            lang: "en".to_string(),
        }
    }

    fn try_load(lang: &str) -> Option<Self> {
        let (_, source) = RESOURCES.iter().find(|(code, _)| *code == lang)?;
        let resource = FluentResource::try_new(source.to_string()).ok()?;
        let langid: LanguageIdentifier = lang.parse().ok()?;
        let mut bundle = FluentBundle::new(vec![langid]);
        bundle.set_use_isolating(false);
        bundle.add_resource(resource).ok()?;
        Some(Self {
            bundle,
            lang: lang.to_string(),
        })
    }

    /// Message `id`, or `id` itself when it is unknown.
    pub fn t(&self, id: &str) -> String {
        self.format(id, None)
    }

    pub fn t_args(&self, id: &str, args: &FluentArgs) -> String {
        self.format(id, Some(args))
    }

    fn format(&self, id: &str, args: Option<&FluentArgs>) -> String {
        let Some(pattern) = self.bundle.get_message(id).and_then(|msg| msg.value()) else {
            return id.to_string();
        };
        let mut errors = Vec::new();
        self.bundle
            .format_pattern(pattern, args, &mut errors)
            .to_string()
    }

    pub fn current_language(&self) -> &str {
        &self.lang
    }
}
