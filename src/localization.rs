use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::warn;
use unic_langid::LanguageIdentifier;

/// Language used when none is requested or the requested one is unknown
pub const DEFAULT_LANGUAGE: &str = "vi";

const RESOURCES: &[(&str, &str)] = &[
    ("vi", include_str!("../locales/vi/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localization manager for the lunch order bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a new localization manager with every bundled language
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (code, source) in RESOURCES {
            let locale: LanguageIdentifier = code.parse()?;
            bundles.insert(code.to_string(), Self::create_bundle(locale, source)?);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(
        locale: LanguageIdentifier,
        source: &str,
    ) -> Result<FluentBundle<FluentResource>> {
        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        // Replies are sent as HTML; bidi isolation marks would show up as noise
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid {} resource: {:?}", locale, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate {} messages: {:?}", locale, errors))?;

        Ok(bundle)
    }

    /// Whether a bundle exists for `language`
    pub fn is_language_supported(&self, language: &str) -> bool {
        self.bundles.contains_key(language)
    }

    /// Get a localized message in a specific language, falling back to the default
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let Some(bundle) = self
            .bundles
            .get(language)
            .or_else(|| self.bundles.get(DEFAULT_LANGUAGE))
        else {
            return format!("Missing translation: {}", key);
        };

        let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
            return format!("Missing translation: {}", key);
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            warn!(key = %key, language = %language, "Formatting errors: {:?}", errors);
        }

        value.into_owned()
    }
}

static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager
pub fn init_localization() -> Result<()> {
    let manager = LocalizationManager::new()?;
    // A second call keeps the first manager
    let _ = LOCALIZATION_MANAGER.set(manager);
    Ok(())
}

/// Get the global localization manager, initializing it on first use
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| match LocalizationManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            warn!(error = %e, "Failed to load localization bundles");
            LocalizationManager {
                bundles: HashMap::new(),
            }
        }
    })
}

/// Localized message in `language`, or the default language
pub fn t_lang(key: &str, language: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(
        key,
        language.unwrap_or(DEFAULT_LANGUAGE),
        None,
    )
}

/// Localized message with simple string arguments
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language: Option<&str>) -> String {
    let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
    get_localization_manager().get_message_in_language(
        key,
        language.unwrap_or(DEFAULT_LANGUAGE),
        Some(&args_map),
    )
}
