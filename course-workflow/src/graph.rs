//! Graph searches over the lookup APIs.
//!
//! Two searches live here: an alternating breadth-first walk over the
//! `people` and `places` endpoints, and a shortest path over the user
//! connection table loaded from the database API.

use async_trait::async_trait;
use course_core::{cell_i64, cell_str, NameList, Result};
use course_sdk::LookupClient;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::{debug, info};

/// Uppercase ASCII form of a Polish word: `"Kraków"` becomes `"KRAKOW"`.
pub fn fold_polish(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| match c {
            'ą' | 'Ą' => 'A',
            'ć' | 'Ć' => 'C',
            'ę' | 'Ę' => 'E',
            'ł' | 'Ł' => 'L',
            'ń' | 'Ń' => 'N',
            'ó' | 'Ó' => 'O',
            'ś' | 'Ś' => 'S',
            'ź' | 'Ź' | 'ż' | 'Ż' => 'Z',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

/// Maps inflected first names to the nominative.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    forms: HashMap<String, String>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        let table: &[(&str, &[&str])] = &[
            ("BARBARA", &["BARBARY", "BARBARZE", "BARBARĄ"]),
            ("ALEKSANDER", &["ALEKSANDRA", "ALEKSANDROWI", "ALEKSANDREM"]),
            ("ANDRZEJ", &["ANDRZEJA", "ANDRZEJOWI", "ANDRZEJEM"]),
            ("RAFAL", &["RAFAŁ", "RAFALA", "RAFALOWI", "RAFALEM"]),
            ("GRZESIEK", &["GRZEŚKA", "GRZEŚKOWI"]),
        ];
        let mut normalizer = Self {
            forms: HashMap::new(),
        };
        for (base, forms) in table {
            for form in *forms {
                normalizer = normalizer.with_form(form, base);
            }
        }
        normalizer
    }
}

impl NameNormalizer {
    pub fn with_form(mut self, form: &str, base: &str) -> Self {
        self.forms.insert(fold_polish(form), fold_polish(base));
        self
    }

    pub fn person(&self, raw: &str) -> String {
        let folded = fold_polish(raw);
        self.forms.get(&folded).cloned().unwrap_or(folded)
    }

    pub fn place(&self, raw: &str) -> String {
        fold_polish(raw)
    }
}

/// Who was seen where.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Places where `person` was seen.
    async fn places_of(&self, person: &str) -> Result<NameList>;
    /// People seen in `place`.
    async fn people_in(&self, place: &str) -> Result<NameList>;
}

#[async_trait]
impl LinkSource for LookupClient {
    async fn places_of(&self, person: &str) -> Result<NameList> {
        Ok(self.people(person).await?)
    }

    async fn people_in(&self, place: &str) -> Result<NameList> {
        Ok(self.places(place).await?)
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub target: String,
    pub seed_people: Vec<String>,
    pub seed_places: Vec<String>,
    /// Places already known for the target; a hit there is not news.
    pub known_places: BTreeSet<String>,
    pub max_layers: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            target: "BARBARA".to_string(),
            seed_people: ["BARBARA", "ALEKSANDER", "ANDRZEJ", "RAFAL", "AZAZEL"]
                .map(String::from)
                .to_vec(),
            seed_places: ["KRAKOW", "WARSZAWA"].map(String::from).to_vec(),
            known_places: BTreeSet::from(["KRAKOW".to_string()]),
            max_layers: 50,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchReport {
    /// Places where the target was seen, in discovery order.
    pub target_seen_in: Vec<String>,
    /// Places whose people list is restricted.
    pub restricted: Vec<String>,
    pub people_locations: BTreeMap<String, Vec<String>>,
    pub place_people: BTreeMap<String, Vec<String>>,
    pub layers: usize,
}

impl SearchReport {
    /// First place the target was seen that is not already known.
    pub fn new_location(&self, known: &BTreeSet<String>) -> Option<&str> {
        self.target_seen_in
            .iter()
            .find(|place| !known.contains(*place))
            .map(String::as_str)
    }
}

/// Alternate between expanding people into places and places into people
/// until both frontiers are empty or `max_layers` layers have run.
pub async fn alternating_search(
    source: &dyn LinkSource,
    config: &SearchConfig,
    names: &NameNormalizer,
) -> Result<SearchReport> {
    let mut report = SearchReport::default();
    let mut people_frontier: Vec<String> = Vec::new();
    let mut places_frontier: Vec<String> = Vec::new();
    let mut seen_people = BTreeSet::new();
    let mut seen_places = BTreeSet::new();

    for person in &config.seed_people {
        enqueue(names.person(person), &mut seen_people, &mut people_frontier);
    }
    for place in &config.seed_places {
        enqueue(names.place(place), &mut seen_places, &mut places_frontier);
    }
    let target = names.person(&config.target);

    while (!people_frontier.is_empty() || !places_frontier.is_empty())
        && report.layers < config.max_layers
    {
        report.layers += 1;
        debug!(
            layer = report.layers,
            people = people_frontier.len(),
            places = places_frontier.len(),
            "Search layer"
        );

        for person in std::mem::take(&mut people_frontier) {
            let reply = source.places_of(&person).await?;
            let places: Vec<String> = reply
                .names()
                .iter()
                .map(|p| names.place(p))
                .filter(|p| p.chars().count() > 2)
                .collect();
            for place in &places {
                enqueue(place.clone(), &mut seen_places, &mut places_frontier);
            }
            report.people_locations.insert(person, places);
        }

        for place in std::mem::take(&mut places_frontier) {
            let reply = source.people_in(&place).await?;
            if reply.is_restricted() {
                info!(place = %place, "Restricted place");
                report.restricted.push(place.clone());
            }
            let people: Vec<String> = reply
                .names()
                .iter()
                .map(|p| names.person(p))
                .filter(|p| p.chars().count() > 2 && p.chars().all(char::is_alphabetic))
                .collect();
            if people.contains(&target) {
                info!(place = %place, target = %target, "Target seen");
                report.target_seen_in.push(place.clone());
            }
            for person in &people {
                enqueue(person.clone(), &mut seen_people, &mut people_frontier);
            }
            report.place_people.insert(place, people);
        }
    }

    Ok(report)
}

fn enqueue(item: String, seen: &mut BTreeSet<String>, frontier: &mut Vec<String>) {
    if !item.is_empty() && seen.insert(item.clone()) {
        frontier.push(item);
    }
}

/// Undirected user graph.
#[derive(Debug, Clone, Default)]
pub struct UserGraph {
    names: BTreeMap<i64, String>,
    adjacency: BTreeMap<i64, BTreeSet<i64>>,
}

impl UserGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `users(id, username)` and `connections(user1_id, user2_id)` rows.
    /// Rows missing a column are skipped.
    pub fn from_rows(users: &[Map<String, Value>], connections: &[Map<String, Value>]) -> Self {
        let mut graph = Self::new();
        for row in users {
            let id = cell_i64(row, "id").or_else(|| cell_i64(row, "0"));
            let name = cell_str(row, "username").or_else(|| cell_str(row, "1"));
            if let (Some(id), Some(name)) = (id, name) {
                graph.add_user(id, name);
            }
        }
        for row in connections {
            let from = cell_i64(row, "user1_id").or_else(|| cell_i64(row, "0"));
            let to = cell_i64(row, "user2_id").or_else(|| cell_i64(row, "1"));
            if let (Some(from), Some(to)) = (from, to) {
                graph.connect(from, to);
            }
        }
        graph
    }

    pub fn add_user(&mut self, id: i64, name: impl Into<String>) {
        self.names.insert(id, name.into());
        self.adjacency.entry(id).or_default();
    }

    pub fn connect(&mut self, a: i64, b: i64) {
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }

    pub fn user_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn name(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// First user (lowest id) whose name contains `needle`, ignoring case and diacritics.
    pub fn find_user(&self, needle: &str) -> Option<i64> {
        let needle = fold_polish(needle);
        self.names
            .iter()
            .find(|(_, name)| fold_polish(name).contains(&needle))
            .map(|(id, _)| *id)
    }

    /// Shortest path from `start` to `goal` by breadth-first search, both ends included.
    pub fn shortest_path(&self, start: i64, goal: i64) -> Option<Vec<i64>> {
        if !self.adjacency.contains_key(&start) || !self.adjacency.contains_key(&goal) {
            return None;
        }
        let mut parent: HashMap<i64, i64> = HashMap::new();
        let mut visited = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(node) = queue.pop_front() {
            if node == goal {
                let mut path = vec![goal];
                let mut current = goal;
                while let Some(&prev) = parent.get(&current) {
                    path.push(prev);
                    current = prev;
                }
                path.reverse();
                return Some(path);
            }
            for &next in self.adjacency.get(&node).into_iter().flatten() {
                if visited.insert(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }

    /// Shortest path between two users found by name, as usernames.
    pub fn path_between(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let start = self.find_user(from)?;
        let goal = self.find_user(to)?;
        self.shortest_path(start, goal)?
            .into_iter()
            .map(|id| self.name(id).map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_polish() {
        assert_eq!(fold_polish(" Kraków "), "KRAKOW");
        assert_eq!(fold_polish("Gdańsk"), "GDANSK");
        assert_eq!(fold_polish("Łódź"), "LODZ");
    }

    #[test]
    fn test_inflected_names() {
        let names = NameNormalizer::default();
        assert_eq!(names.person("Barbarą"), "BARBARA");
        assert_eq!(names.person("aleksandrowi"), "ALEKSANDER");
        assert_eq!(names.person("Rafał"), "RAFAL");
        assert_eq!(names.person("Grześka"), "GRZESIEK");
        assert_eq!(names.person("Azazel"), "AZAZEL");
    }

    #[test]
    fn test_shortest_path_prefers_fewest_hops() {
        let mut graph = UserGraph::new();
        for (id, name) in [(1, "Rafał"), (2, "Adam"), (3, "Azazel"), (4, "Barbara"), (5, "Zygfryd")] {
            graph.add_user(id, name);
        }
        graph.connect(1, 2);
        graph.connect(2, 3);
        graph.connect(3, 4);
        graph.connect(1, 5);
        graph.connect(5, 4);

        assert_eq!(graph.shortest_path(1, 4), Some(vec![1, 5, 4]));
        assert_eq!(
            graph.path_between("rafal", "BARBARA"),
            Some(vec!["Rafał".to_string(), "Zygfryd".to_string(), "Barbara".to_string()])
        );
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn test_unreachable_user() {
        let mut graph = UserGraph::new();
        graph.add_user(1, "Rafał");
        graph.add_user(2, "Barbara");
        assert_eq!(graph.shortest_path(1, 2), None);
        assert_eq!(graph.shortest_path(1, 1), Some(vec![1]));
        assert_eq!(graph.path_between("Rafał", "Nobody"), None);
    }
}
