use async_trait::async_trait;
use course_core::{NameList, Result};
use course_workflow::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory people/places index.
#[derive(Default)]
struct FakeLinks {
    people: HashMap<String, NameList>,
    places: HashMap<String, NameList>,
    queries: AtomicUsize,
}

impl FakeLinks {
    fn person(mut self, name: &str, places: &str) -> Self {
        self.people.insert(name.to_string(), NameList::decode(&places.into()));
        self
    }

    fn place(mut self, name: &str, people: &str) -> Self {
        self.places.insert(name.to_string(), NameList::decode(&people.into()));
        self
    }
}

#[async_trait]
impl LinkSource for FakeLinks {
    async fn places_of(&self, person: &str) -> Result<NameList> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .people
            .get(person)
            .cloned()
            .unwrap_or(NameList::NotFound(String::new())))
    }

    async fn people_in(&self, place: &str) -> Result<NameList> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .places
            .get(place)
            .cloned()
            .unwrap_or(NameList::NotFound(String::new())))
    }
}

fn config(people: &[&str], places: &[&str]) -> SearchConfig {
    SearchConfig {
        seed_people: people.iter().map(|s| s.to_string()).collect(),
        seed_places: places.iter().map(|s| s.to_string()).collect(),
        ..SearchConfig::default()
    }
}

// ===== Alternating Search Tests =====

#[tokio::test]
async fn test_inflected_names_are_merged() {
    let links = FakeLinks::default()
        .person("RAFAL", "LUBLIN")
        .place("LUBLIN", "RAFAŁA BARBARZE")
        .person("BARBARA", "LUBLIN");

    let report = alternating_search(&links, &config(&["Rafał"], &[]), &NameNormalizer::default())
        .await
        .unwrap();

    assert_eq!(report.target_seen_in, vec!["LUBLIN"]);
    assert_eq!(
        report.place_people.get("LUBLIN"),
        Some(&vec!["RAFAL".to_string(), "BARBARA".to_string()])
    );
    // RAFAL, LUBLIN, BARBARA: each queried once.
    assert_eq!(links.queries.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_restricted_place_is_recorded_without_people() {
    let links = FakeLinks::default()
        .person("AZAZEL", "GRUDZIADZ")
        .place("GRUDZIADZ", "[**RESTRICTED DATA**]");

    let report = alternating_search(&links, &config(&["Azazel"], &[]), &NameNormalizer::default())
        .await
        .unwrap();

    assert_eq!(report.restricted, vec!["GRUDZIADZ"]);
    assert!(report.target_seen_in.is_empty());
    assert_eq!(report.new_location(&BTreeSet::new()), None);
}

#[tokio::test]
async fn test_layer_bound() {
    // A chain that would go on for four layers.
    let links = FakeLinks::default()
        .person("ADAM", "AAA")
        .place("AAA", "BOGDAN")
        .person("BOGDAN", "BBB")
        .place("BBB", "CEZARY")
        .person("CEZARY", "CCC")
        .place("CCC", "DAREK")
        .person("DAREK", "DDD")
        .place("DDD", "BARBARA");
    let search = SearchConfig {
        max_layers: 2,
        ..config(&["Adam"], &[])
    };

    let report = alternating_search(&links, &search, &NameNormalizer::default())
        .await
        .unwrap();

    assert_eq!(report.layers, 2);
    assert!(report.target_seen_in.is_empty());
    assert!(report.people_locations.contains_key("BOGDAN"));
    assert!(!report.people_locations.contains_key("CEZARY"));
}

// ===== Name Normalisation Tests =====

#[rstest::rstest]
#[case("Barbarą", "BARBARA")]
#[case("rafał", "RAFAL")]
#[case("Aleksandra", "ALEKSANDER")]
#[case("  Zofia ", "ZOFIA")]
fn test_person_names_fold_to_nominative(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(NameNormalizer::default().person(raw), expected);
}

#[rstest::rstest]
#[case("Kraków", "KRAKOW")]
#[case("ELBLĄG", "ELBLAG")]
fn test_places_fold_diacritics(#[case] raw: &str, #[case] expected: &str) {
    assert_eq!(NameNormalizer::default().place(raw), expected);
}
