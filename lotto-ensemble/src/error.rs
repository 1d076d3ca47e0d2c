use thiserror::Error;

/// Refus d'un classifieur d'apprendre sur les données fournies.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrainingError {
    #[error("jeu d'entraînement vide")]
    EmptyTrainingSet,

    #[error("étiquettes dégénérées : {positives} positifs sur {total} lignes")]
    DegenerateLabels { positives: usize, total: usize },

    #[error("dimensions incohérentes : {rows} lignes pour {labels} étiquettes")]
    ShapeMismatch { rows: usize, labels: usize },
}

#[derive(Debug, Error)]
pub enum EnsembleError {
    #[error("historique insuffisant : {draws} tirages, {required} requis")]
    InsufficientHistory { draws: usize, required: usize },

    #[error("famille {family}, numéro {number} : {source}")]
    ClassifierTraining {
        family: String,
        number: u8,
        source: TrainingError,
    },

    #[error("aucune des {attempted} familles n'a pu être entraînée")]
    NoFamilyTrained { attempted: usize },

    #[error("aucun score à départager")]
    NoCandidates,

    #[error("famille inconnue : {0}")]
    UnknownFamily(String),

    #[error("configuration invalide : {0}")]
    InvalidConfig(String),

    #[error("lecture de l'historique impossible : {0}")]
    History(String),
}

/// Échec isolé d'une famille pendant un backtest : les autres familles continuent.
#[derive(Debug)]
pub struct FamilyFailure {
    pub family: String,
    pub error: EnsembleError,
}
