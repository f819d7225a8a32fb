use sculptor::{AppAuthor, FileIO, ProjectInfo, impl_serde_str_toml};
use serde::{Deserialize, Serialize};
use tagless_codegen::DEFAULT_ENTRY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    /// the top-level binding entered by `tagless_entry`
    pub entry: String,
    /// precede generated functions with `#line` directives
    pub line_directives: bool,
}

impl Default for Conf {
    fn default() -> Self {
        Conf { entry: DEFAULT_ENTRY.to_string(), line_directives: false }
    }
}

impl_serde_str_toml!(Conf);

impl AppAuthor for Conf {
    fn app_name() -> &'static str {
        "Tagless"
    }

    fn author() -> &'static str {
        "Tagless"
    }
}

impl Conf {
    /// Read `tagless.toml` from the configuration directory, writing the
    /// defaults there if it is missing or unreadable.
    pub fn load() -> Self {
        let path = Conf::config_dir().join("tagless.toml");
        let file_conf = FileIO::new(path.clone());
        file_conf.load().unwrap_or_else(|_| {
            log::warn!("Using default configuration; suppose to find one at `{}`.", path.display());
            let conf = Conf::default();
            if let Err(err) = file_conf.save(&conf) {
                log::warn!("could not save the default configuration: {err:?}");
            }
            conf
        })
    }
}
