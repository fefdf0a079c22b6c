use crate::helpers::format_thousands;
use crate::summary::ClusterAggregateStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Age band of a cluster's average customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeCategory {
    Young,
    MiddleAged,
    Mature,
    Senior,
}
impl AgeCategory {
    pub fn from_avg(avg_age: f64) -> Self {
        if avg_age < 30.0 { AgeCategory::Young }
        else if avg_age < 45.0 { AgeCategory::MiddleAged }
        else if avg_age < 60.0 { AgeCategory::Mature }
        else { AgeCategory::Senior }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeCategory::Young => "Young",
            AgeCategory::MiddleAged => "Middle-Aged",
            AgeCategory::Mature => "Mature",
            AgeCategory::Senior => "Senior",
        }
    }
}

/// Income band of a cluster's average customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomeCategory {
    Budget,
    MidTier,
    Affluent,
    HighIncome,
}
impl IncomeCategory {
    pub fn from_avg(avg_income: f64) -> Self {
        if avg_income < 30000.0 { IncomeCategory::Budget }
        else if avg_income < 50000.0 { IncomeCategory::MidTier }
        else if avg_income < 70000.0 { IncomeCategory::Affluent }
        else { IncomeCategory::HighIncome }
    }

    pub fn label(self) -> &'static str {
        match self {
            IncomeCategory::Budget => "Budget",
            IncomeCategory::MidTier => "Mid-Tier",
            IncomeCategory::Affluent => "Affluent",
            IncomeCategory::HighIncome => "High-Income",
        }
    }
}

/// Band of a cluster's average purchase amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpendingCategory {
    Conservative,
    Moderate,
    Active,
    Premium,
}
impl SpendingCategory {
    pub fn from_avg(avg_purchase: f64) -> Self {
        if avg_purchase < 1500.0 { SpendingCategory::Conservative }
        else if avg_purchase < 2500.0 { SpendingCategory::Moderate }
        else if avg_purchase < 3500.0 { SpendingCategory::Active }
        else { SpendingCategory::Premium }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpendingCategory::Conservative => "Conservative",
            SpendingCategory::Moderate => "Moderate",
            SpendingCategory::Active => "Active",
            SpendingCategory::Premium => "Premium",
        }
    }
}

macro_rules! impl_display_via_label {
    ($($t: ty),*) => {$(
        impl Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
        }
    )*};
}
impl_display_via_label!(AgeCategory, IncomeCategory, SpendingCategory);


/// Segment name, e.g. `High-Income Mature Premium`.
pub fn cluster_name(avg_age: f64, avg_income: f64, avg_purchase: f64) -> String {
    format!("{} {} {}",
        IncomeCategory::from_avg(avg_income), AgeCategory::from_avg(avg_age), SpendingCategory::from_avg(avg_purchase))
}

/// One sentence summarizing the segment.
pub fn describe(stats: &ClusterAggregateStats) -> String {
    format!(
        "This segment consists of {} customers characterized by {} demographics (avg age {:.1}), \
         {} income levels (avg ${}), and {} spending behavior (avg ${} per purchase).",
        format_thousands(stats.customer_count as f64),
        AgeCategory::from_avg(stats.avg_age).label().to_lowercase(),
        stats.avg_age,
        IncomeCategory::from_avg(stats.avg_income).label().to_lowercase(),
        format_thousands(stats.avg_income),
        SpendingCategory::from_avg(stats.avg_purchase_amount).label().to_lowercase(),
        format_thousands(stats.avg_purchase_amount),
    )
}


/// A predicate over the cluster statistics together with the actions recommended when it holds.
pub struct RecommendationRule {
    pub name: &'static str,
    pub applies: fn(&ClusterAggregateStats) -> bool,
    pub actions: &'static [&'static str],
}
impl fmt::Debug for RecommendationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecommendationRule").field("name", &self.name).finish()
    }
}

/// Recommendation rules, in evaluation order. The first rule that applies wins; the last one always applies.
pub static RECOMMENDATION_RULES: [RecommendationRule; 7] = [
    RecommendationRule {
        name: "high_value",
        applies: |s| s.avg_income > 70000.0 && s.avg_purchase_amount > 3000.0,
        actions: &[
            "Target with premium product offerings and exclusive services",
            "Implement VIP loyalty program with personalized benefits",
            "Focus on high-touch customer service and relationship building",
            "Offer premium financing options and extended warranties",
        ],
    },
    RecommendationRule {
        name: "untapped_potential",
        applies: |s| s.avg_income > 70000.0 && s.avg_purchase_amount < 2000.0,
        actions: &[
            "Identify barriers to purchase and address them through targeted campaigns",
            "Introduce mid-tier to premium product lines to match income level",
            "Provide educational content about product value propositions",
            "Test promotional offers to convert high-income browsers to buyers",
        ],
    },
    RecommendationRule {
        name: "young",
        applies: |s| s.avg_age < 30.0,
        actions: &[
            "Leverage social media marketing and influencer partnerships",
            "Offer entry-level product bundles and flexible payment plans",
            "Create referral programs with incentives for word-of-mouth marketing",
            "Develop mobile-first shopping experiences and apps",
        ],
    },
    RecommendationRule {
        name: "middle_aged",
        applies: |s| s.avg_age >= 30.0 && s.avg_age < 55.0,
        actions: &[
            "Focus on value proposition and quality messaging",
            "Offer family-oriented products and bundled solutions",
            "Implement email marketing with personalized recommendations",
            "Provide loyalty rewards that accumulate over time",
        ],
    },
    RecommendationRule {
        name: "senior",
        applies: |s| s.avg_age >= 55.0,
        actions: &[
            "Emphasize ease of use, reliability, and customer support",
            "Provide clear documentation and instructional content",
            "Offer phone-based customer service and personal assistance",
            "Focus on products that enhance comfort and convenience",
        ],
    },
    RecommendationRule {
        name: "budget",
        applies: |s| s.avg_income < 40000.0,
        actions: &[
            "Highlight value pricing and cost-saving benefits",
            "Offer payment plans and budget-friendly options",
            "Create promotional campaigns around seasonal sales",
            "Develop entry-level product lines with strong quality-to-price ratio",
        ],
    },
    RecommendationRule {
        name: "general",
        applies: |_| true,
        actions: &[
            "Implement cross-selling strategies based on purchase history",
            "Create targeted email campaigns with personalized offers",
            "Develop customer retention programs with periodic incentives",
            "Test upselling opportunities with complementary products",
        ],
    },
];

/// The first rule of [`RECOMMENDATION_RULES`] that applies to **stats**.
pub fn matching_rule(stats: &ClusterAggregateStats) -> &'static RecommendationRule {
    let rules: &'static [RecommendationRule] = &RECOMMENDATION_RULES;
    rules.iter()
        .find(|rule| (rule.applies)(stats))
        .unwrap_or(&rules[rules.len() - 1])
}

/// Recommended actions for the segment, joined with `"; "`.
pub fn recommend(stats: &ClusterAggregateStats) -> String {
    matching_rule(stats).actions.join("; ")
}


/// Human readable interpretation of one cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub name: String,
    pub description: String,
    pub recommendations: String,
}

pub fn interpret(stats: &ClusterAggregateStats) -> ClusterProfile {
    ClusterProfile {
        name: cluster_name(stats.avg_age, stats.avg_income, stats.avg_purchase_amount),
        description: describe(stats),
        recommendations: recommend(stats),
    }
}

/// Interpret every cluster, keeping the cluster indices.
pub fn interpret_all(stats: &BTreeMap<usize, ClusterAggregateStats>) -> BTreeMap<usize, ClusterProfile> {
    stats.iter().map(|(&idx, s)| (idx, interpret(s))).collect()
}


#[cfg(test)]
mod tests {
    use super::*;

    fn stats(avg_age: f64, avg_income: f64, avg_purchase_amount: f64, customer_count: usize) -> ClusterAggregateStats {
        ClusterAggregateStats { avg_age, avg_income, avg_purchase_amount, customer_count, ..Default::default() }
    }

    #[test]
    fn band_boundaries_are_half_open() {
        assert_eq!(AgeCategory::from_avg(29.99), AgeCategory::Young);
        assert_eq!(AgeCategory::from_avg(30.0), AgeCategory::MiddleAged);
        assert_eq!(AgeCategory::from_avg(45.0), AgeCategory::Mature);
        assert_eq!(AgeCategory::from_avg(60.0), AgeCategory::Senior);

        assert_eq!(IncomeCategory::from_avg(29999.99), IncomeCategory::Budget);
        assert_eq!(IncomeCategory::from_avg(30000.0), IncomeCategory::MidTier);
        assert_eq!(IncomeCategory::from_avg(50000.0), IncomeCategory::Affluent);
        assert_eq!(IncomeCategory::from_avg(70000.0), IncomeCategory::HighIncome);

        assert_eq!(SpendingCategory::from_avg(1499.0), SpendingCategory::Conservative);
        assert_eq!(SpendingCategory::from_avg(1500.0), SpendingCategory::Moderate);
        assert_eq!(SpendingCategory::from_avg(2500.0), SpendingCategory::Active);
        assert_eq!(SpendingCategory::from_avg(3500.0), SpendingCategory::Premium);
    }

    #[test]
    fn name_is_income_age_spending() {
        assert_eq!(cluster_name(25.0, 20000.0, 500.0), "Budget Young Conservative");
        assert_eq!(cluster_name(40.0, 55000.0, 2000.0), "Affluent Middle-Aged Moderate");
        assert_eq!(cluster_name(65.0, 45000.0, 3000.0), "Mid-Tier Senior Active");
    }

    #[test]
    fn high_value_mature_segment() {
        let profile = interpret(&stats(58.0, 85000.0, 4500.0, 120));
        // 58 falls into the 45..60 band
        assert_eq!(profile.name, "High-Income Mature Premium");
        assert!(profile.recommendations.starts_with(
            "Target with premium product offerings and exclusive services; Implement VIP loyalty program"));
        assert_eq!(matching_rule(&stats(58.0, 85000.0, 4500.0, 120)).name, "high_value");
    }

    #[test]
    fn income_of_exactly_70000_is_not_high_value() {
        assert_eq!(matching_rule(&stats(58.0, 70000.0, 4500.0, 10)).name, "senior");
        assert_eq!(matching_rule(&stats(40.0, 70000.0, 1000.0, 10)).name, "middle_aged");
        assert_eq!(matching_rule(&stats(40.0, 70000.01, 1000.0, 10)).name, "untapped_potential");
    }

    #[test]
    fn purchase_between_2000_and_3000_skips_income_rules() {
        assert_eq!(matching_rule(&stats(25.0, 90000.0, 2500.0, 10)).name, "young");
        assert_eq!(matching_rule(&stats(25.0, 90000.0, 3000.0, 10)).name, "young");
    }

    #[test]
    fn age_rules_switch_at_30_and_55() {
        assert_eq!(matching_rule(&stats(29.9, 35000.0, 1000.0, 10)).name, "young");
        assert_eq!(matching_rule(&stats(30.0, 35000.0, 1000.0, 10)).name, "middle_aged");
        assert_eq!(matching_rule(&stats(54.99, 35000.0, 1000.0, 10)).name, "middle_aged");
        assert_eq!(matching_rule(&stats(55.0, 35000.0, 1000.0, 10)).name, "senior");
    }

    #[test]
    fn undefined_age_falls_through_to_income_rules() {
        assert_eq!(matching_rule(&stats(f64::NAN, 35000.0, 1000.0, 10)).name, "budget");
        assert_eq!(matching_rule(&stats(f64::NAN, 45000.0, 1000.0, 10)).name, "general");
    }

    #[test]
    fn every_rule_has_four_actions() {
        for rule in RECOMMENDATION_RULES.iter() {
            assert_eq!(rule.actions.len(), 4, "{:?}", rule);
        }
        assert_eq!(recommend(&stats(25.0, 20000.0, 500.0, 1)).matches("; ").count(), 3);
    }

    #[test]
    fn description_text() {
        let s = stats(58.04, 85000.4, 4500.5, 1200);
        assert_eq!(describe(&s),
            "This segment consists of 1,200 customers characterized by mature demographics (avg age 58.0), \
             high-income income levels (avg $85,000), and premium spending behavior (avg $4,501 per purchase).");
    }

    #[test]
    fn interpret_all_keeps_indices() {
        let mut all = BTreeMap::new();
        all.insert(0, stats(25.0, 20000.0, 500.0, 2));
        all.insert(3, stats(56.0, 92500.0, 4100.0, 2));
        let profiles = interpret_all(&all);
        assert_eq!(profiles.keys().cloned().collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(profiles[&0].name, "Budget Young Conservative");
        assert_eq!(profiles[&3].name, "High-Income Mature Premium");
    }
}
