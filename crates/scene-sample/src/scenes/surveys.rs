//! Survey response visualization, as data. Each question kind has a fixed
//! chart template; building one is a pure function from the survey shape
//! to a declarative [`ChartQuery`] the rendering layer can execute. The
//! folds that turn raw responses into distributions live here too.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Survey {
    pub id: String,
    pub name: String,
    pub questions: Vec<SurveyQuestion>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurveyQuestion {
    Rating { question: String, scale: u8 },
    SingleChoice { question: String, options: Vec<String> },
    OpenText { question: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
    Table,
}

/// A chart the rendering layer should draw: which kind, over which
/// question, with which buckets on the category axis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartQuery {
    pub chart: ChartKind,
    pub survey_id: String,
    pub question_index: usize,
    pub buckets: Vec<String>,
}

/// The chart template for one question. Ratings become bars over
/// `1..=scale`, single choices a pie over the options, open text a plain
/// table with no buckets.
pub fn chart_for(survey: &Survey, question_index: usize) -> Option<ChartQuery> {
    let question = survey.questions.get(question_index)?;
    let (chart, buckets) = match question {
        SurveyQuestion::Rating { scale, .. } => {
            (ChartKind::Bar, (1..=*scale).map(|n| n.to_string()).collect())
        }
        SurveyQuestion::SingleChoice { options, .. } => (ChartKind::Pie, options.clone()),
        SurveyQuestion::OpenText { .. } => (ChartKind::Table, Vec::new()),
    };
    Some(ChartQuery { chart, survey_id: survey.id.clone(), question_index, buckets })
}

/// One chart per question, in question order.
pub fn charts_for(survey: &Survey) -> Vec<ChartQuery> {
    (0..survey.questions.len()).filter_map(|index| chart_for(survey, index)).collect()
}

/// Folds raw rating responses into per-bucket counts for `1..=scale`.
/// Responses outside the scale are dropped, not clamped.
pub fn rating_distribution(scale: u8, responses: &[u8]) -> Vec<u64> {
    let mut counts = vec![0u64; scale as usize];
    for &response in responses {
        if (1..=scale).contains(&response) {
            counts[response as usize - 1] += 1;
        }
    }
    counts
}

/// Net promoter breakdown of 0-10 ratings: detractors 0-6, passives 7-8,
/// promoters 9-10.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct NpsBreakdown {
    pub detractors: u64,
    pub passives: u64,
    pub promoters: u64,
}

impl NpsBreakdown {
    pub fn from_responses(responses: &[u8]) -> Self {
        let mut breakdown = NpsBreakdown::default();
        for &response in responses {
            match response {
                0..=6 => breakdown.detractors += 1,
                7..=8 => breakdown.passives += 1,
                9..=10 => breakdown.promoters += 1,
                _ => {}
            }
        }
        breakdown
    }

    pub fn total(&self) -> u64 {
        self.detractors + self.passives + self.promoters
    }

    /// The score in `[-100, 100]`, `0.0` when there are no responses.
    pub fn score(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let promoters = self.promoters as f64 / total as f64;
        let detractors = self.detractors as f64 / total as f64;
        (promoters - detractors) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Survey {
        Survey {
            id: "srv_1".into(),
            name: "Onboarding feedback".into(),
            questions: vec![
                SurveyQuestion::Rating { question: "How was setup?".into(), scale: 5 },
                SurveyQuestion::SingleChoice {
                    question: "Favorite feature?".into(),
                    options: vec!["Pipelines".into(), "Replay".into()],
                },
                SurveyQuestion::OpenText { question: "Anything else?".into() },
            ],
        }
    }

    #[test]
    fn each_question_kind_gets_its_template() {
        let charts = charts_for(&survey());
        assert_eq!(charts.len(), 3);
        assert_eq!(charts[0].chart, ChartKind::Bar);
        assert_eq!(charts[0].buckets, vec!["1", "2", "3", "4", "5"]);
        assert_eq!(charts[1].chart, ChartKind::Pie);
        assert_eq!(charts[1].buckets, vec!["Pipelines", "Replay"]);
        assert_eq!(charts[2].chart, ChartKind::Table);
        assert!(charts[2].buckets.is_empty());
        assert!(charts.iter().all(|chart| chart.survey_id == "srv_1"));
    }

    #[test]
    fn out_of_range_question_index_builds_nothing() {
        assert!(chart_for(&survey(), 3).is_none());
    }

    #[test]
    fn distribution_counts_every_bucket_and_drops_strays() {
        let counts = rating_distribution(5, &[1, 5, 5, 3, 0, 6, 5]);
        assert_eq!(counts, vec![1, 0, 1, 0, 3]);
    }

    #[test]
    fn empty_responses_fold_to_zeroed_buckets() {
        assert_eq!(rating_distribution(3, &[]), vec![0, 0, 0]);
    }

    #[test]
    fn nps_score_spans_the_full_range() {
        let all_promoters = NpsBreakdown::from_responses(&[9, 10, 10]);
        assert_eq!(all_promoters.score(), 100.0);

        let all_detractors = NpsBreakdown::from_responses(&[0, 3, 6]);
        assert_eq!(all_detractors.score(), -100.0);

        let mixed = NpsBreakdown::from_responses(&[10, 10, 8, 0]);
        assert_eq!(mixed.detractors, 1);
        assert_eq!(mixed.passives, 1);
        assert_eq!(mixed.promoters, 2);
        assert_eq!(mixed.score(), 25.0);

        assert_eq!(NpsBreakdown::default().score(), 0.0);
    }
}
