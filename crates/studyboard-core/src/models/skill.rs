use std::fmt;

use serde::{Deserialize, Serialize};

use super::ChapterId;

/// Skill categories shown on the profile radar chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    DataPreprocessing,
    MlFundamentals,
    ModelEvaluation,
    UnsupervisedLearning,
    DeepLearning,
    Cnn,
    Rnn,
    Transformer,
    Llm,
    GitTooling,
}

impl Skill {
    pub const ALL: [Skill; 10] = [
        Skill::DataPreprocessing,
        Skill::MlFundamentals,
        Skill::ModelEvaluation,
        Skill::UnsupervisedLearning,
        Skill::DeepLearning,
        Skill::Cnn,
        Skill::Rnn,
        Skill::Transformer,
        Skill::Llm,
        Skill::GitTooling,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Skill::DataPreprocessing => "Data Preprocessing",
            Skill::MlFundamentals => "ML Fundamentals",
            Skill::ModelEvaluation => "Model Evaluation",
            Skill::UnsupervisedLearning => "Unsupervised Learning",
            Skill::DeepLearning => "Deep Learning",
            Skill::Cnn => "CNN",
            Skill::Rnn => "RNN",
            Skill::Transformer => "Transformer",
            Skill::Llm => "LLM",
            Skill::GitTooling => "Git/GitHub",
        }
    }

    /// Normalisation ceiling for this skill.
    ///
    /// ML fundamentals is capped above what the chapters can award (70), so
    /// a full run tops out at 82%.
    pub fn max_points(self) -> u32 {
        match self {
            Skill::DataPreprocessing => 45,
            Skill::MlFundamentals => 85,
            Skill::ModelEvaluation => 50,
            Skill::UnsupervisedLearning => 25,
            Skill::DeepLearning => 60,
            Skill::Cnn => 25,
            Skill::Rnn => 20,
            Skill::Transformer => 25,
            Skill::Llm => 10,
            Skill::GitTooling => 11,
        }
    }

    /// Points a completed chapter contributes to this skill
    pub fn points_for(self, chapter: ChapterId) -> u32 {
        use Skill::*;
        match (chapter.number(), self) {
            (1, DataPreprocessing) => 5,
            (1, MlFundamentals) => 15,
            (1, GitTooling) => 3,

            (2, DataPreprocessing) => 20,
            (2, MlFundamentals) => 10,
            (2, ModelEvaluation) => 5,
            (2, GitTooling) => 5,

            (3, MlFundamentals) => 15,
            (3, ModelEvaluation) => 15,
            (3, DataPreprocessing) => 5,

            (4, MlFundamentals) => 15,
            (4, ModelEvaluation) => 10,

            (5, MlFundamentals) => 15,
            (5, ModelEvaluation) => 15,
            (5, DataPreprocessing) => 5,

            (6, UnsupervisedLearning) => 25,
            (6, DataPreprocessing) => 10,

            (7, DeepLearning) => 20,
            (7, ModelEvaluation) => 5,
            (7, GitTooling) => 3,

            (8, Cnn) => 25,
            (8, DeepLearning) => 10,

            (9, DeepLearning) => 15,
            (9, Rnn) => 20,

            (10, DeepLearning) => 15,
            (10, Transformer) => 25,
            (10, Llm) => 10,

            _ => 0,
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
