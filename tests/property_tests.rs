use proptest::prelude::*;
use tui_news_app::config::AppConfig;
use tui_news_app::internal::controller::{Controller, ViewState};
use tui_news_app::internal::models::{Article, PageOutcome};
use tui_news_app::internal::ui::view::wrap_text;

fn page(n: usize, offset: usize) -> Vec<Article> {
    (0..n)
        .map(|i| Article {
            title: format!("Article {}", offset + i),
            ..Article::default()
        })
        .collect()
}

proptest! {
    #[test]
    fn test_wrap_text_no_panic(s in "\\PC*", width in 0usize..200) {
        let wrapped = wrap_text(&s, width);
        prop_assert!(!wrapped.is_empty());
    }

    #[test]
    fn test_wrap_text_keeps_words(s in "[a-z]{1,8}( [a-z]{1,8}){0,20}", width in 8usize..80) {
        let wrapped = wrap_text(&s, width);
        prop_assert!(wrapped.iter().all(|line| line.chars().count() <= width));
        prop_assert_eq!(wrapped.join(" "), s);
    }

    #[test]
    fn test_config_parsing_resilience(s in "\\PC*") {
        // Random input may fail to parse but must not panic.
        let _ = ron::from_str::<AppConfig>(&s);
    }

    #[test]
    fn test_only_latest_generation_applies(searches in 1usize..6, answered in 0usize..6) {
        let mut controller = Controller::new(10);
        let mut generations = vec![controller.start().generation];
        for i in 0..searches {
            generations.push(controller.submit_search(&format!("term{i}")).generation);
        }
        let latest = *generations.last().unwrap();

        // Stale completions never touch the list or the state.
        for generation in generations.iter().filter(|g| **g != latest).take(answered) {
            controller.complete(*generation, Ok(PageOutcome::Articles {
                articles: page(3, 0),
                total_results: 3,
            }));
            prop_assert_eq!(controller.state(), ViewState::Loading);
            prop_assert!(controller.articles().is_empty());
        }

        controller.complete(latest, Ok(PageOutcome::Articles {
            articles: page(2, 0),
            total_results: 2,
        }));
        prop_assert_eq!(controller.state(), ViewState::Loaded);
        prop_assert_eq!(controller.articles().len(), 2);
    }

    #[test]
    fn test_pages_accumulate_in_order(sizes in prop::collection::vec(1usize..5, 1..6)) {
        let total: usize = sizes.iter().sum();
        let mut controller = Controller::new(5);
        let mut request = Some(controller.start());
        let mut offset = 0;

        for size in &sizes {
            let current = request.take().unwrap();
            controller.complete(current.generation, Ok(PageOutcome::Articles {
                articles: page(*size, offset),
                total_results: total as u64,
            }));
            offset += size;
            request = controller.load_more();
        }

        prop_assert!(request.is_none());
        prop_assert!(!controller.show_more());
        let titles: Vec<String> = controller.articles().iter().map(|a| a.title.clone()).collect();
        let expected: Vec<String> = (0..total).map(|i| format!("Article {i}")).collect();
        prop_assert_eq!(titles, expected);
    }
}
