use super::{
    client::ApiClient,
    errors::{ErrorContext, Operation},
    resources::ListParams,
    types::{
        ApiError, CircuitRaceCount, ConstructorPoints, NationalityStat, SeasonOverview, TopDriver,
    },
};

const DASHBOARD: &str = "dashboard";

impl ApiClient {
    pub async fn top_drivers_by_wins(&self, params: &ListParams) -> Result<Vec<TopDriver>, ApiError> {
        // Without a sort the endpoint orders by wins, descending.
        self.get_json(
            &ErrorContext::new(DASHBOARD, Operation::List),
            "dashboard/top_drivers_by_wins",
            &params.to_query(),
        )
        .await
    }

    pub async fn constructor_championships(&self) -> Result<Vec<ConstructorPoints>, ApiError> {
        self.get_json(
            &ErrorContext::new(DASHBOARD, Operation::List),
            "dashboard/constructor_championships",
            &[],
        )
        .await
    }

    pub async fn circuits_race_count(&self) -> Result<Vec<CircuitRaceCount>, ApiError> {
        self.get_json(
            &ErrorContext::new(DASHBOARD, Operation::List),
            "dashboard/circuits_race_count",
            &[],
        )
        .await
    }

    pub async fn driver_nationality_stats(&self) -> Result<Vec<NationalityStat>, ApiError> {
        self.get_json(
            &ErrorContext::new(DASHBOARD, Operation::List),
            "dashboard/driver_nationality_stats",
            &[],
        )
        .await
    }

    pub async fn season_results_overview(&self) -> Result<Vec<SeasonOverview>, ApiError> {
        self.get_json(
            &ErrorContext::new(DASHBOARD, Operation::List),
            "dashboard/season_results_overview",
            &[],
        )
        .await
    }
}

/// Groups constructor points by season, preserving the server's order within
/// each year.
pub fn points_by_season(
    points: &[ConstructorPoints],
) -> std::collections::BTreeMap<i32, Vec<&ConstructorPoints>> {
    let mut seasons = std::collections::BTreeMap::new();
    for entry in points {
        seasons
            .entry(entry.year)
            .or_insert_with(Vec::new)
            .push(entry);
    }
    seasons
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_are_grouped_per_season() {
        let points = vec![
            ConstructorPoints {
                year: 2006,
                constructor: "Renault".into(),
                total_points: 206.0,
            },
            ConstructorPoints {
                year: 2005,
                constructor: "Renault".into(),
                total_points: 191.0,
            },
            ConstructorPoints {
                year: 2006,
                constructor: "Ferrari".into(),
                total_points: 201.0,
            },
        ];
        let seasons = points_by_season(&points);
        assert_eq!(seasons.keys().copied().collect::<Vec<_>>(), vec![2005, 2006]);
        let names: Vec<&str> = seasons[&2006]
            .iter()
            .map(|p| p.constructor.as_str())
            .collect();
        assert_eq!(names, vec!["Renault", "Ferrari"]);
    }
}
