//! Macro-generated contract tests for [`Repositories`](yooreed::storage::Repositories)
//!
//! `repository_tests!(factory)` validates a backend against the repository
//! contract: CRUD, unique constraints, filters, sorting and paging, text
//! search, named counters and code generation on top of them.
//!
//! `$factory` is re-evaluated for each test and must yield empty storage.

/// Generate the repository conformance suite for a storage backend.
#[macro_export]
macro_rules! repository_tests {
    ($factory:expr) => {
        mod repository_contract_tests {
            use super::*;
            use std::sync::Arc;
            use yooreed::core::code::{CodeGenerator, FixedClock, SequenceStrategy};
            use yooreed::core::field::FieldValue;
            use yooreed::storage::{Filter, FindOptions, Sort, StoreError};

            // ==============================================================
            // CRUD
            // ==============================================================

            #[tokio::test]
            async fn test_insert_then_find_by_id() {
                let repos = $factory;
                let vases = repos.categories.insert(category("Vases", None)).await.unwrap();

                let found = repos.categories.find_by_id(&vases.id).await.unwrap().unwrap();
                assert_eq!(found.name, "Vases");
                assert_eq!(found.slug, "vases");
                assert!(found.parent_id.is_none());
            }

            #[tokio::test]
            async fn test_find_missing_is_none() {
                let repos = $factory;
                let id = uuid::Uuid::new_v4();
                assert!(repos.categories.find_by_id(&id).await.unwrap().is_none());
                assert!(repos.categories.update_by_id(&id, category("X", None)).await.unwrap().is_none());
                assert!(repos.categories.delete_by_id(&id).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_update_and_delete() {
                let repos = $factory;
                let mut vases = repos.categories.insert(category("Vases", None)).await.unwrap();

                vases.description = "En verre soufflé".to_string();
                let updated = repos
                    .categories
                    .update_by_id(&vases.id, vases.clone())
                    .await
                    .unwrap()
                    .unwrap();
                assert_eq!(updated.description, "En verre soufflé");

                let deleted = repos.categories.delete_by_id(&vases.id).await.unwrap();
                assert_eq!(deleted.map(|c| c.id), Some(vases.id));
                assert!(repos.categories.find_by_id(&vases.id).await.unwrap().is_none());
            }

            // ==============================================================
            // Unique constraints
            // ==============================================================

            #[tokio::test]
            async fn test_duplicate_name_rejected() {
                let repos = $factory;
                repos.categories.insert(category("Vases", None)).await.unwrap();

                let err = repos.categories.insert(category("Vases", None)).await.unwrap_err();
                assert!(matches!(err, StoreError::DuplicateKey { .. }), "got {:?}", err);
                assert_eq!(repos.categories.count(&Filter::new()).await.unwrap(), 1);
            }

            #[tokio::test]
            async fn test_update_cannot_take_another_unique_value() {
                let repos = $factory;
                repos.categories.insert(category("Vases", None)).await.unwrap();
                let mut bougies = repos.categories.insert(category("Bougies", None)).await.unwrap();

                bougies.rename("Vases");
                let err = repos
                    .categories
                    .update_by_id(&bougies.id, bougies.clone())
                    .await
                    .unwrap_err();
                assert!(matches!(err, StoreError::DuplicateKey { .. }));
            }

            #[tokio::test]
            async fn test_duplicate_order_code_names_the_field() {
                let repos = $factory;
                let mut first = order();
                first.code = Some("CMD-1-000001".to_string());
                let mut second = order();
                second.code = first.code.clone();

                repos.orders.insert(first).await.unwrap();
                let err = repos.orders.insert(second).await.unwrap_err();
                assert!(err.is_duplicate_of("numeroCommande"), "got {:?}", err);
            }

            // ==============================================================
            // Filters, sorting, paging
            // ==============================================================

            #[tokio::test]
            async fn test_filter_null_parent_and_ne() {
                let repos = $factory;
                let vases = repos.categories.insert(category("Vases", None)).await.unwrap();
                repos
                    .categories
                    .insert(category("Vases en verre", Some(vases.id)))
                    .await
                    .unwrap();

                let roots = Filter::new().eq("parentId", FieldValue::Null);
                assert_eq!(repos.categories.count(&roots).await.unwrap(), 1);

                let children = Filter::new().eq("parentId", vases.id);
                assert_eq!(repos.categories.count(&children).await.unwrap(), 1);

                let others = Filter::new().eq("slug", "vases").ne("_id", vases.id);
                assert!(repos.categories.find_one(&others).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_sort_skip_limit() {
                let repos = $factory;
                for name in ["Delta", "Alpha", "Charlie", "Bravo"] {
                    repos.categories.insert(category(name, None)).await.unwrap();
                }

                let page = repos
                    .categories
                    .find_many(&Filter::new(), &FindOptions::page(Sort::asc("nom"), 1, 2))
                    .await
                    .unwrap();
                let names: Vec<_> = page.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["Bravo", "Charlie"]);

                let all = repos
                    .categories
                    .find_many(&Filter::new(), &FindOptions::sorted(Sort::desc("nom")))
                    .await
                    .unwrap();
                assert_eq!(all.first().map(|c| c.name.as_str()), Some("Delta"));
                assert_eq!(all.len(), 4);
            }

            #[tokio::test]
            async fn test_nested_field_filter() {
                let repos = $factory;
                repos.orders.insert(order()).await.unwrap();

                let mine = Filter::new().eq("client.email", "alice@example.com");
                assert_eq!(repos.orders.count(&mine).await.unwrap(), 1);
                let pending = Filter::new().eq("statut", "en_attente");
                assert_eq!(repos.orders.count(&pending).await.unwrap(), 1);
                let shipped = Filter::new().eq("statut", "expediee");
                assert_eq!(repos.orders.count(&shipped).await.unwrap(), 0);
            }

            // ==============================================================
            // Counters and codes
            // ==============================================================

            #[tokio::test]
            async fn test_counter_seed_is_applied_once() {
                let repos = $factory;
                repos.sequences.seed("orders", 5).await.unwrap();
                assert_eq!(repos.sequences.increment("orders").await.unwrap(), 6);

                repos.sequences.seed("orders", 100).await.unwrap();
                assert_eq!(repos.sequences.increment("orders").await.unwrap(), 7);
                assert_eq!(repos.sequences.increment("quotes").await.unwrap(), 1);
            }

            #[tokio::test]
            async fn test_codes_are_sequential() {
                let repos = $factory;
                let codes = CodeGenerator::new(repos.sequences.clone(), SequenceStrategy::Counter);

                let mut suffixes = Vec::new();
                for _ in 0..3 {
                    let saved = codes.insert_with_code(order(), repos.orders.as_ref()).await.unwrap();
                    let code = saved.code.unwrap();
                    assert!(code.starts_with("CMD-"), "{}", code);
                    suffixes.push(code.rsplit('-').next().unwrap().to_string());
                }
                assert_eq!(suffixes, vec!["000001", "000002", "000003"]);
            }

            #[tokio::test]
            async fn test_colliding_code_is_regenerated_once() {
                let repos = $factory;
                let codes = CodeGenerator::with_clock(
                    repos.sequences.clone(),
                    SequenceStrategy::Count,
                    Arc::new(FixedClock(1_700_000_000_000)),
                );

                // Both records read the same count before either is stored
                let mut late = order();
                codes.prepare_for_insert(&mut late, repos.orders.as_ref()).await;
                let early = codes.insert_with_code(order(), repos.orders.as_ref()).await.unwrap();
                assert_eq!(early.code.as_deref(), late.code.as_deref());

                let late = codes.insert_with_code(late, repos.orders.as_ref()).await.unwrap();
                assert_eq!(early.code.as_deref(), Some("CMD-1700000000000-000001"));
                assert_eq!(late.code.as_deref(), Some("CMD-1700000000000-000002"));
            }
        }
    };
}
