//! 员工评价统计
//!
//! CSAT = 正面评分数 / 总评分数 * 100，保留一位小数。

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::models::{CategoryKind, ScoreFilter};
use crate::repository::{TaxonomyRepositoryTrait, WaiterScoreRepositoryTrait};

/// 员工 CSAT 报告
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsatReport {
    pub waiter_id: i64,
    pub csat: f64,
    pub total_feedbacks: i64,
    pub positive_feedbacks: i64,
}

/// 分类名称 -> (标签名称 -> 次数)
pub type TagStats = BTreeMap<String, BTreeMap<String, i64>>;

/// 计算 CSAT，结果总在 [0, 100]
pub fn compute_csat(positive: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let ratio = positive.clamp(0, total) as f64 / total as f64;
    ((ratio * 1000.0).round() / 10.0).clamp(0.0, 100.0)
}

pub struct StatsService {
    scores: Arc<dyn WaiterScoreRepositoryTrait>,
    taxonomy: Arc<dyn TaxonomyRepositoryTrait>,
}

impl StatsService {
    pub fn new(
        scores: Arc<dyn WaiterScoreRepositoryTrait>,
        taxonomy: Arc<dyn TaxonomyRepositoryTrait>,
    ) -> Self {
        Self { scores, taxonomy }
    }

    #[instrument(skip(self))]
    pub async fn csat(&self, waiter_id: i64) -> Result<CsatReport> {
        let total = self.scores.count_scores(waiter_id, ScoreFilter::All).await?;

        let positive = match self
            .taxonomy
            .find_category_by_kind(CategoryKind::Positive)
            .await?
        {
            Some(category) if total > 0 => {
                self.scores
                    .count_scores(waiter_id, ScoreFilter::Category(category.id))
                    .await?
            }
            _ => 0,
        };

        Ok(CsatReport {
            waiter_id,
            csat: compute_csat(positive, total),
            total_feedbacks: total,
            positive_feedbacks: positive,
        })
    }

    /// 按正面、中性、负面三个分类统计各标签次数
    ///
    /// 未配置的分类以其编码为键、值为空表。
    #[instrument(skip(self))]
    pub async fn tag_stats(&self, waiter_id: i64) -> Result<TagStats> {
        let mut stats = TagStats::new();

        for kind in CategoryKind::ALL {
            let Some(category) = self.taxonomy.find_category_by_kind(kind).await? else {
                stats.insert(kind.to_string(), BTreeMap::new());
                continue;
            };

            let mut counts = BTreeMap::new();
            for tag in self.taxonomy.list_tags(Some(category.id)).await? {
                let count = self
                    .scores
                    .count_scores(waiter_id, ScoreFilter::Tag(tag.id))
                    .await?;
                *counts.entry(tag.name).or_insert(0) += count;
            }
            stats.insert(category.name, counts);
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Tag};
    use crate::repository::{MockTaxonomyRepositoryTrait, MockWaiterScoreRepositoryTrait};

    #[test]
    fn test_compute_csat() {
        assert_eq!(compute_csat(0, 0), 0.0);
        assert_eq!(compute_csat(3, 0), 0.0);
        assert_eq!(compute_csat(1, 3), 33.3);
        assert_eq!(compute_csat(2, 3), 66.7);
        assert_eq!(compute_csat(5, 5), 100.0);
        assert_eq!(compute_csat(9, 5), 100.0);
        assert_eq!(compute_csat(-1, 5), 0.0);
    }

    fn positive_only_taxonomy() -> MockTaxonomyRepositoryTrait {
        let mut taxonomy = MockTaxonomyRepositoryTrait::new();
        taxonomy.expect_find_category_by_kind().returning(|kind| {
            Ok((kind == CategoryKind::Positive).then(|| Category {
                id: 1,
                name: "положительный".to_string(),
                kind: Some(kind),
            }))
        });
        taxonomy
    }

    #[tokio::test]
    async fn test_csat_report() {
        let mut scores = MockWaiterScoreRepositoryTrait::new();
        scores
            .expect_count_scores()
            .returning(|_, filter| match filter {
                ScoreFilter::All => Ok(8),
                ScoreFilter::Category(1) => Ok(6),
                _ => Ok(0),
            });

        let svc = StatsService::new(Arc::new(scores), Arc::new(positive_only_taxonomy()));
        let report = svc.csat(5).await.unwrap();
        assert_eq!(report.csat, 75.0);
        assert_eq!(report.total_feedbacks, 8);
        assert_eq!(report.positive_feedbacks, 6);
    }

    #[tokio::test]
    async fn test_csat_without_scores_is_zero() {
        let mut scores = MockWaiterScoreRepositoryTrait::new();
        scores
            .expect_count_scores()
            .withf(|_, filter| *filter == ScoreFilter::All)
            .returning(|_, _| Ok(0));

        let svc = StatsService::new(Arc::new(scores), Arc::new(positive_only_taxonomy()));
        assert_eq!(svc.csat(5).await.unwrap().csat, 0.0);
    }

    #[tokio::test]
    async fn test_tag_stats_includes_zero_counts_and_missing_kinds() {
        let mut taxonomy = positive_only_taxonomy();
        taxonomy.expect_list_tags().returning(|_| {
            Ok(vec![
                Tag {
                    id: 1,
                    name: "вежливость".to_string(),
                    category_id: 1,
                },
                Tag {
                    id: 2,
                    name: "скорость".to_string(),
                    category_id: 1,
                },
            ])
        });
        let mut scores = MockWaiterScoreRepositoryTrait::new();
        scores
            .expect_count_scores()
            .returning(|_, filter| Ok(if filter == ScoreFilter::Tag(1) { 4 } else { 0 }));

        let svc = StatsService::new(Arc::new(scores), Arc::new(taxonomy));
        let stats = svc.tag_stats(5).await.unwrap();

        let positive = &stats["положительный"];
        assert_eq!(positive["вежливость"], 4);
        assert_eq!(positive["скорость"], 0);
        assert!(stats["neutral"].is_empty());
        assert!(stats["negative"].is_empty());
    }
}
