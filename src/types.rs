/// A parameter operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamAction {
    List,
    Get { key: String },
    Set { key: String, value: String },
    Unset { key: String },
}
