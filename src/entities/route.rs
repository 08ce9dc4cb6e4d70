use serde::{Deserialize, Serialize};

use crate::entities::Waypoint;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub name: String,
    pub waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(id: impl Into<String>, name: impl Into<String>, waypoints: Vec<Waypoint>) -> Self {
        Route {
            id: id.into(),
            name: name.into(),
            waypoints,
        }
    }

    pub fn first_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.first()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Calm,
    Adventurous,
    Curious,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeBudget {
    OneHour,
    HalfDay,
    FullDay,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Parks,
    Museums,
    Cafes,
}

/// Criteria forwarded to the route-filter backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteFilter {
    pub mood: Option<Mood>,
    pub budget: Option<Budget>,
    pub time: Option<TimeBudget>,
    pub category: Option<Category>,
}

impl Mood {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Calm => "calm",
            Self::Adventurous => "adventurous",
            Self::Curious => "curious",
        }
    }
}

impl Category {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Parks => "parks",
            Self::Museums => "museums",
            Self::Cafes => "cafes",
        }
    }
}

impl RouteFilter {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![];

        if let Some(mood) = self.mood {
            query.push(("mood", mood.name().to_string()));
        }

        match self.budget {
            Some(Budget::Low) => query.push(("budget_max__lte", "50".into())),
            Some(Budget::Medium) => query.push(("budget_max__lte", "200".into())),
            Some(Budget::High) => query.push(("budget_max__gte", "200".into())),
            None => {}
        }

        match self.time {
            Some(TimeBudget::OneHour) => query.push(("duration__lte", "60".into())),
            Some(TimeBudget::HalfDay) => query.push(("duration__lte", "240".into())),
            Some(TimeBudget::FullDay) => query.push(("duration__lte", "480".into())),
            None => {}
        }

        if let Some(category) = self.category {
            query.push(("category", category.name().to_string()));
        }

        query
    }
}

#[test]
fn route_filter_query_test() {
    let filter = RouteFilter {
        mood: Some(Mood::Curious),
        budget: Some(Budget::High),
        time: Some(TimeBudget::HalfDay),
        category: Some(Category::Museums),
    };

    assert_eq!(
        filter.query(),
        vec![
            ("mood", "curious".to_string()),
            ("budget_max__gte", "200".to_string()),
            ("duration__lte", "240".to_string()),
            ("category", "museums".to_string()),
        ]
    );

    assert!(RouteFilter::default().query().is_empty());
}
