use crate::domain::model::{Campaign, CampaignStatus, Lead, LeadStatus};
use serde::Serialize;

/// Derived campaign rates, as fractions in `0..=1` (or above, if opens outnumber sends).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CampaignRates {
    pub open_rate: f64,
    pub click_rate: f64,
    pub conversion_rate: f64,
}

impl CampaignRates {
    pub fn of(campaign: &Campaign) -> Self {
        let sends = campaign.total_sends;
        Self {
            open_rate: ratio(campaign.total_opens, sends),
            click_rate: ratio(campaign.total_clicks, sends),
            conversion_rate: ratio(campaign.total_conversions, sends),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub active_campaigns: usize,
    pub total_sends: u64,
    pub average_open_rate: f64,
    pub total_conversions: u64,
    pub total_revenue: f64,
}

impl CampaignSummary {
    /// The open rate here is pooled: total opens over total sends.
    pub fn from_campaigns(campaigns: &[Campaign]) -> Self {
        let total_sends = campaigns.iter().map(|c| c.total_sends).sum();
        let total_opens = campaigns.iter().map(|c| c.total_opens).sum();

        Self {
            active_campaigns: campaigns
                .iter()
                .filter(|c| c.status == CampaignStatus::Active)
                .count(),
            total_sends,
            average_open_rate: ratio(total_opens, total_sends),
            total_conversions: campaigns.iter().map(|c| c.total_conversions).sum(),
            total_revenue: campaigns.iter().map(|c| c.revenue_generated).sum(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterRegression {
    pub campaign_id: String,
    pub counter: &'static str,
    pub previous: u64,
    pub current: u64,
}

/// Counters only grow between snapshots of the same campaign; reports each one that shrank.
pub fn check_counter_progression(previous: &Campaign, current: &Campaign) -> Vec<CounterRegression> {
    let counters = [
        ("total_sends", previous.total_sends, current.total_sends),
        ("total_opens", previous.total_opens, current.total_opens),
        ("total_clicks", previous.total_clicks, current.total_clicks),
        ("total_conversions", previous.total_conversions, current.total_conversions),
    ];

    counters
        .into_iter()
        .filter(|(_, before, after)| after < before)
        .map(|(counter, before, after)| {
            tracing::warn!(
                "Campaign '{}' {} went backwards: {} -> {}",
                current.id,
                counter,
                before,
                after
            );
            CounterRegression {
                campaign_id: current.id.clone(),
                counter,
                previous: before,
                current: after,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageCount {
    pub status: LeadStatus,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    /// One entry per status, in funnel order, zero counts included.
    pub stages: Vec<StageCount>,
    pub open: usize,
    pub terminal: usize,
}

impl PipelineSummary {
    pub fn from_leads(leads: &[Lead]) -> Self {
        let stages: Vec<StageCount> = LeadStatus::PIPELINE
            .iter()
            .map(|status| StageCount {
                status: *status,
                count: leads.iter().filter(|l| l.status == *status).count(),
            })
            .collect();

        let terminal = stages
            .iter()
            .filter(|s| s.status.is_terminal())
            .map(|s| s.count)
            .sum();

        Self {
            open: leads.len() - terminal,
            terminal,
            stages,
        }
    }

    pub fn count(&self, status: LeadStatus) -> usize {
        self.stages
            .iter()
            .find(|s| s.status == status)
            .map_or(0, |s| s.count)
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign(id: &str, status: CampaignStatus, sends: u64, opens: u64) -> Campaign {
        Campaign {
            id: id.to_string(),
            name: format!("Campaign {}", id),
            status,
            campaign_type: None,
            total_sends: sends,
            total_opens: opens,
            total_clicks: opens / 2,
            total_conversions: opens / 10,
            revenue_generated: 1_000.0,
            created_at: None,
        }
    }

    #[test]
    fn test_rates_are_zero_without_sends() {
        let rates = CampaignRates::of(&campaign("1", CampaignStatus::Draft, 0, 0));
        assert_eq!(rates.open_rate, 0.0);
        assert_eq!(rates.click_rate, 0.0);
        assert_eq!(rates.conversion_rate, 0.0);
    }

    #[test]
    fn test_rates() {
        let rates = CampaignRates::of(&campaign("1", CampaignStatus::Active, 1000, 400));
        assert_eq!(rates.open_rate, 0.4);
        assert_eq!(rates.click_rate, 0.2);
        assert_eq!(rates.conversion_rate, 0.04);
    }

    #[test]
    fn test_summary_pools_open_rate() {
        let campaigns = vec![
            campaign("1", CampaignStatus::Active, 1000, 500),
            campaign("2", CampaignStatus::Paused, 3000, 500),
            campaign("3", CampaignStatus::Draft, 0, 0),
        ];
        let summary = CampaignSummary::from_campaigns(&campaigns);

        assert_eq!(summary.active_campaigns, 1);
        assert_eq!(summary.total_sends, 4000);
        assert_eq!(summary.average_open_rate, 0.25);
        assert_eq!(summary.total_conversions, 100);
        assert_eq!(summary.total_revenue, 3_000.0);
    }

    #[test]
    fn test_counter_regression() {
        let before = campaign("1", CampaignStatus::Active, 1000, 400);
        let mut after = before.clone();
        after.total_opens = 390;
        after.total_clicks = 150;
        after.total_sends = 1200;

        let regressions = check_counter_progression(&before, &after);
        assert_eq!(regressions.len(), 2);
        assert_eq!(regressions[0].counter, "total_opens");
        assert_eq!(regressions[1].counter, "total_clicks");
        assert!(check_counter_progression(&before, &before).is_empty());
    }
}
