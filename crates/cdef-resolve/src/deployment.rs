//! Deployment of classifications onto columns.
//!
//! Sources, in registration order (the first registration of a column wins):
//!
//! 1. the explicit deployment definition
//! 2. `relatedColumnName` of resource classifications, under `$$ALL$$`
//! 3. the `$$ALL$$` entries, copied into every table entry
//! 4. the code column of each table classification source, and every
//!    single-column foreign key referencing it when it is the sole primary key
//!
//! Assignments naming documentation-only classifications are dropped last.

use tracing::{debug, info};

use cdef_definition::DeploymentDefinition;
use cdef_model::{
    ClassificationModel, ClassificationOrigin, DeploymentMap, SchemaModel, WILDCARD, fold_key,
};

/// Resolve the deployment map. Pure: the same inputs give the same map.
pub fn resolve_deployment(
    explicit: &DeploymentDefinition,
    model: &ClassificationModel,
    schema: &SchemaModel,
) -> DeploymentMap {
    let mut map = DeploymentMap::new();

    for (table, columns) in &explicit.tables {
        let entry = map.table_entry(table);
        for (column, classification) in columns {
            entry.register(column, classification);
        }
    }

    for top in model.iter() {
        if top.origin != ClassificationOrigin::Resource {
            continue;
        }
        if let Some(column) = &top.related_column_name {
            map.register(WILDCARD, column, &top.name);
        }
    }

    let wildcard = wildcard_entries(&map);
    if !wildcard.is_empty() {
        let tables: Vec<String> = map
            .iter()
            .map(|(table, _)| table.to_string())
            .filter(|table| !is_wildcard(table))
            .collect();
        for table in tables {
            let entry = map.table_entry(&table);
            for (column, classification) in &wildcard {
                entry.register(column, classification);
            }
        }
    }

    for top in model.table_classifications() {
        for source in top.deployable_sources() {
            let Some(code_column) = source.code_column.as_deref() else {
                continue;
            };
            register_seeded(&mut map, &wildcard, &source.table, code_column, &top.name);

            let Some(table) = schema.table(&source.table) else {
                continue;
            };
            if !table.is_sole_primary_key(code_column) {
                continue;
            }
            for (referrer, key) in schema.simple_referrers(&table.name, code_column) {
                let Some(local_column) = key.local_columns.first() else {
                    continue;
                };
                if register_seeded(&mut map, &wildcard, &referrer.name, local_column, &top.name) {
                    debug!(
                        classification = %top.name,
                        table = %referrer.name,
                        column = %local_column,
                        "deployed through foreign key"
                    );
                }
            }
        }
    }

    map.retain_classifications(|classification| !model.is_document_only(classification));

    info!(
        tables = map.table_count(),
        assignments = map.assignment_count(),
        "resolved classification deployment"
    );
    map
}

fn is_wildcard(table: &str) -> bool {
    fold_key(table) == WILDCARD
}

fn wildcard_entries(map: &DeploymentMap) -> Vec<(String, String)> {
    map.wildcard()
        .map(|assignments| {
            assignments
                .iter()
                .map(|(column, classification)| (column.to_string(), classification.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Register an assignment. A table entry created here starts with the
/// entries of every matching table pattern, then the wildcard entries.
fn register_seeded(
    map: &mut DeploymentMap,
    wildcard: &[(String, String)],
    table: &str,
    column: &str,
    classification: &str,
) -> bool {
    let seed = if map.contains_table(table) {
        None
    } else {
        Some(map.pattern_assignments(table))
    };
    let entry = map.table_entry(table);
    if let Some(patterns) = seed {
        for (seed_column, seed_classification) in patterns.iter().chain(wildcard) {
            entry.register(seed_column, seed_classification);
        }
    }
    entry.register(column, classification)
}

#[cfg(test)]
mod tests {
    use cdef_model::{
        ClassificationTop, ForeignKey, Table, TableSource, UndefinedHandlingType,
    };
    use indexmap::IndexMap;

    use super::*;

    fn table_top(name: &str, table: &str, column: &str) -> ClassificationTop {
        let mut top = ClassificationTop::new(name, ClassificationOrigin::Table, UndefinedHandlingType::Logging);
        top.is_table_classification = true;
        top.table_sources.push(TableSource {
            table: table.to_string(),
            code_column: Some(column.to_string()),
            suppress_auto_deploy: false,
            suppress_db_access_class: false,
        });
        top
    }

    fn model(tops: Vec<ClassificationTop>) -> ClassificationModel {
        let mut model = ClassificationModel::default();
        for top in tops {
            model.tops.insert(top.name.clone(), top);
        }
        model
    }

    fn explicit(entries: &[(&str, &str, &str)]) -> DeploymentDefinition {
        let mut tables: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        for (table, column, name) in entries {
            tables
                .entry(table.to_string())
                .or_default()
                .insert(column.to_string(), name.to_string());
        }
        DeploymentDefinition { tables }
    }

    fn order_schema() -> SchemaModel {
        let mut status = Table::new("ORDER_STATUS");
        status.primary_key = vec!["STATUS_CODE".to_string()];
        let mut line = Table::new("ORDER_LINE");
        line.primary_key = vec!["ORDER_ID".to_string(), "LINE_NO".to_string()];
        line.foreign_keys
            .push(ForeignKey::simple("STATUS_CODE", "ORDER_STATUS", "STATUS_CODE"));
        SchemaModel::new(vec![status, line])
    }

    #[test]
    fn explicit_entries_win_over_wildcard() {
        let map = resolve_deployment(
            &explicit(&[
                ("$$ALL$$", "DELETE_FLG", "TrueFalse"),
                ("MEMBER", "DELETE_FLG", "Flg"),
            ]),
            &model(Vec::new()),
            &SchemaModel::default(),
        );
        assert_eq!(map.classification_name_for("MEMBER", "DELETE_FLG"), Some("Flg"));
        assert_eq!(map.classification_name_for("PURCHASE", "DELETE_FLG"), Some("TrueFalse"));
    }

    #[test]
    fn wildcard_exact_column_beats_table_pattern() {
        let map = resolve_deployment(
            &explicit(&[
                ("MEMBER", "suffix:_FLG", "Flg"),
                ("$$ALL$$", "DELETE_FLG", "TrueFalse"),
            ]),
            &model(Vec::new()),
            &SchemaModel::default(),
        );
        assert_eq!(map.classification_name_for("MEMBER", "DELETE_FLG"), Some("TrueFalse"));
        assert_eq!(map.classification_name_for("MEMBER", "PAID_FLG"), Some("Flg"));
    }

    #[test]
    fn code_column_propagates_over_simple_foreign_keys() {
        let map = resolve_deployment(
            &DeploymentDefinition::default(),
            &model(vec![table_top("OrderStatus", "ORDER_STATUS", "STATUS_CODE")]),
            &order_schema(),
        );
        assert_eq!(
            map.classification_name_for("ORDER_STATUS", "STATUS_CODE"),
            Some("OrderStatus")
        );
        assert_eq!(
            map.classification_name_for("ORDER_LINE", "STATUS_CODE"),
            Some("OrderStatus")
        );
    }

    #[test]
    fn explicit_assignment_is_never_overwritten() {
        let map = resolve_deployment(
            &explicit(&[("ORDER_LINE", "STATUS_CODE", "LineStatus")]),
            &model(vec![table_top("OrderStatus", "ORDER_STATUS", "STATUS_CODE")]),
            &order_schema(),
        );
        assert_eq!(
            map.classification_name_for("ORDER_LINE", "STATUS_CODE"),
            Some("LineStatus")
        );
    }

    #[test]
    fn no_propagation_from_compound_or_non_key_columns() {
        let mut status = Table::new("ORDER_STATUS");
        status.primary_key = vec!["STATUS_CODE".to_string(), "LANG".to_string()];
        let mut line = Table::new("ORDER_LINE");
        line.foreign_keys
            .push(ForeignKey::simple("STATUS_CODE", "ORDER_STATUS", "STATUS_CODE"));
        let schema = SchemaModel::new(vec![status, line]);

        let map = resolve_deployment(
            &DeploymentDefinition::default(),
            &model(vec![table_top("OrderStatus", "ORDER_STATUS", "STATUS_CODE")]),
            &schema,
        );
        assert_eq!(map.classification_name_for("ORDER_LINE", "STATUS_CODE"), None);
    }

    #[test]
    fn table_pattern_assignments_survive_auto_deploy() {
        let map = resolve_deployment(
            &explicit(&[
                ("prefix:ORDER_", "DELETE_FLG", "Flg"),
                ("prefix:ORDER_", "STATUS_CODE", "PatternStatus"),
                ("$$ALL$$", "DELETE_FLG", "TrueFalse"),
            ]),
            &model(vec![table_top("OrderStatus", "ORDER_STATUS", "STATUS_CODE")]),
            &order_schema(),
        );
        assert_eq!(map.classification_name_for("ORDER_STATUS", "DELETE_FLG"), Some("Flg"));
        assert_eq!(map.classification_name_for("ORDER_LINE", "DELETE_FLG"), Some("Flg"));
        assert_eq!(
            map.classification_name_for("ORDER_LINE", "STATUS_CODE"),
            Some("PatternStatus")
        );
        assert_eq!(map.classification_name_for("MEMBER", "DELETE_FLG"), Some("TrueFalse"));
    }

    #[test]
    fn column_patterns_do_not_block_code_column_deploy() {
        let map = resolve_deployment(
            &explicit(&[("ORDER_LINE", "suffix:_FLG", "Flg")]),
            &model(vec![table_top("OrderStatus", "ORDER_STATUS", "STATUS_CODE")]),
            &order_schema(),
        );
        assert_eq!(
            map.classification_name_for("ORDER_LINE", "STATUS_CODE"),
            Some("OrderStatus")
        );
        assert_eq!(map.classification_name_for("ORDER_LINE", "CANCEL_FLG"), Some("Flg"));
    }

    #[test]
    fn suppressed_sources_are_not_deployed() {
        let mut top = table_top("OrderStatus", "ORDER_STATUS", "STATUS_CODE");
        top.suppress_auto_deploy = true;
        let map = resolve_deployment(&DeploymentDefinition::default(), &model(vec![top]), &order_schema());
        assert_eq!(map.table_count(), 0);
    }

    #[test]
    fn resource_related_column_deploys_everywhere() {
        let mut region = ClassificationTop::new(
            "Region",
            ClassificationOrigin::Resource,
            UndefinedHandlingType::Logging,
        );
        region.related_column_name = Some("REGION_CODE".to_string());
        let map = resolve_deployment(
            &explicit(&[("MEMBER", "REGION_CODE", "MemberRegion")]),
            &model(vec![region]),
            &SchemaModel::default(),
        );
        assert_eq!(map.classification_name_for("MEMBER", "REGION_CODE"), Some("MemberRegion"));
        assert_eq!(map.classification_name_for("PURCHASE", "REGION_CODE"), Some("Region"));
    }

    #[test]
    fn document_only_names_are_stripped() {
        let mut model = model(Vec::new());
        model.document_only_names.insert("Secret".to_string());
        let map = resolve_deployment(
            &explicit(&[("MEMBER", "SECRET_CODE", "Secret"), ("MEMBER", "FLG", "Flg")]),
            &model,
            &SchemaModel::default(),
        );
        assert_eq!(map.classification_name_for("MEMBER", "SECRET_CODE"), None);
        assert_eq!(map.classification_name_for("MEMBER", "FLG"), Some("Flg"));
    }
}
