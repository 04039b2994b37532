//! Classification model building.
//!
//! The builder walks validated definitions in order, runs table and
//! all-in-one extraction through one lazily opened connection, merges
//! resource classifications and applies the post-processing passes:
//!
//! 1. resource merge (duplicate names are fatal)
//! 2. documentation-only removal, unless this is a documentation run
//! 3. grouping and deprecation validation
//! 4. accessor-suppressed table collection

use tracing::{debug, info, warn};

use cdef_definition::{
    ClassificationDefinitions, EntryShape, LiteralDefinition, ResourceDefinition,
    TopMetaDefinition,
};
use cdef_model::{
    ClassificationElement, ClassificationError, ClassificationModel, ClassificationOrigin,
    ClassificationTop, Result, SqlDialect, TableSource,
};

use crate::database::{ConnectionFactory, LazyConnection};
use crate::extract::{extract_all_in_one, extract_table_elements};
use crate::handling::HandlingResolver;

/// Builds one [`ClassificationModel`] per run.
#[derive(Debug)]
pub struct ModelBuilder<'f> {
    handling: HandlingResolver,
    dialect: SqlDialect,
    documentation_run: bool,
    connection: LazyConnection<'f>,
}

impl<'f> ModelBuilder<'f> {
    pub fn new(handling: HandlingResolver, factory: &'f dyn ConnectionFactory) -> Self {
        Self {
            handling,
            dialect: SqlDialect::default(),
            documentation_run: false,
            connection: LazyConnection::new(factory),
        }
    }

    pub fn dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Keep documentation-only classifications.
    pub fn documentation_run(mut self, documentation_run: bool) -> Self {
        self.documentation_run = documentation_run;
        self
    }

    /// Build the model. The connection, if opened, is closed on return.
    pub fn build(
        mut self,
        definitions: &ClassificationDefinitions,
        resources: Vec<ClassificationTop>,
    ) -> Result<ClassificationModel> {
        let mut model = ClassificationModel::default();

        for (name, entries) in &definitions.classifications {
            let top = self.build_top(name, entries)?;
            insert_top(&mut model, top)?;
        }

        if let Some(sql) = &definitions.all_in_one_sql {
            self.merge_all_in_one(&mut model, sql)?;
        }
        self.connection.close();

        for top in resources {
            insert_top(&mut model, top)?;
        }

        if !self.documentation_run {
            remove_document_only(&mut model);
        }
        validate_references(&model)?;
        collect_suppressed_tables(&mut model);

        info!(
            classifications = model.len(),
            document_only = model.document_only_names.len(),
            "built classification model"
        );
        Ok(model)
    }

    fn build_top(&mut self, name: &str, entries: &[EntryShape]) -> Result<ClassificationTop> {
        let mut top = ClassificationTop::new(
            name,
            ClassificationOrigin::Literal,
            self.handling.plain_handling_type(),
        );
        let mut meta: Option<&TopMetaDefinition> = None;

        for entry in entries {
            match entry {
                EntryShape::TopMeta(definition) => {
                    if meta.is_some() {
                        warn!(
                            classification = name,
                            "top metadata defined more than once, the later entry overwrites the earlier"
                        );
                    }
                    meta = Some(definition);
                }
                EntryShape::TableSource(source) => {
                    let extracted =
                        extract_table_elements(name, source, self.dialect, &mut self.connection)?;
                    for element in extracted {
                        if top.contains_code(&element.code) {
                            debug!(classification = name, code = %element.code, "skipping repeated code");
                            continue;
                        }
                        top.elements.push(element);
                    }
                    top.is_table_classification = true;
                    top.origin = ClassificationOrigin::Table;
                    top.table_sources.push(TableSource {
                        table: source.table.clone(),
                        code_column: source.code_column().map(str::to_string),
                        suppress_auto_deploy: source.suppress_auto_deploy,
                        suppress_db_access_class: source.suppress_db_access_class,
                    });
                }
                EntryShape::Literal(literal) => push_literal(&mut top, literal)?,
            }
        }

        if let Some(meta) = meta {
            apply_top_meta(&mut top, meta);
            let handling = self
                .handling
                .resolve_handling_type(name, &meta.handling_hints())?;
            top.set_handling(handling);
            if let Some(check) = meta.check_classification_code {
                top.check_classification_code = check;
            }
        }
        debug!(
            classification = name,
            origin = %top.origin,
            elements = top.elements.len(),
            handling = %top.undefined_handling_type,
            "built classification"
        );
        Ok(top)
    }

    fn merge_all_in_one(&mut self, model: &mut ClassificationModel, sql: &str) -> Result<()> {
        for group in extract_all_in_one(sql, &mut self.connection)? {
            let top = model.tops.entry(group.name.clone()).or_insert_with(|| {
                ClassificationTop::new(
                    group.name.clone(),
                    ClassificationOrigin::AllInOne,
                    self.handling.plain_handling_type(),
                )
            });
            if top.top_comment.is_none() {
                top.top_comment = group.top_comment;
            }
            if top.code_type.is_none() {
                top.code_type = group.code_type;
            }
            top.elements.extend(group.elements);
        }
        Ok(())
    }
}

/// Turn resource definitions into classifications.
///
/// Resource classifications are literal only and always use the plain
/// handling type. A name defined by two resource files is fatal.
pub fn load_resource_definitions(
    resources: &[ResourceDefinition],
    handling: HandlingResolver,
) -> Result<Vec<ClassificationTop>> {
    let mut tops: Vec<ClassificationTop> = Vec::new();
    for resource in resources {
        for (name, entries) in &resource.definitions.classifications {
            if tops.iter().any(|top| top.name == *name) {
                return Err(ClassificationError::DuplicateClassification {
                    name: name.clone(),
                    existing: ClassificationOrigin::Resource,
                    duplicate: ClassificationOrigin::Resource,
                });
            }
            let mut top = ClassificationTop::new(
                name,
                ClassificationOrigin::Resource,
                handling.plain_handling_type(),
            );
            for entry in entries {
                match entry {
                    EntryShape::TopMeta(meta) => {
                        apply_top_meta(&mut top, meta);
                        if let Some(check) = meta.check_classification_code {
                            top.check_classification_code = check;
                        }
                    }
                    EntryShape::Literal(literal) => push_literal(&mut top, literal)?,
                    EntryShape::TableSource(_) => {
                        return Err(ClassificationError::shape(
                            format!("{}: {name}", resource.path.display()),
                            "literal element",
                            "table source",
                        ));
                    }
                }
            }
            tops.push(top);
        }
    }
    debug!(classifications = tops.len(), "loaded resource classifications");
    Ok(tops)
}

fn insert_top(model: &mut ClassificationModel, top: ClassificationTop) -> Result<()> {
    if let Some(existing) = model.tops.get(&top.name) {
        return Err(ClassificationError::DuplicateClassification {
            name: top.name,
            existing: existing.origin,
            duplicate: top.origin,
        });
    }
    model.tops.insert(top.name.clone(), top);
    Ok(())
}

fn push_literal(top: &mut ClassificationTop, literal: &LiteralDefinition) -> Result<()> {
    if top.contains_code(&literal.code) {
        return Err(ClassificationError::DuplicateElementCode {
            classification: top.name.clone(),
            code: literal.code.clone(),
        });
    }
    let mut element = ClassificationElement::new(&top.name, &literal.code, &literal.name);
    element.alias = literal.alias.clone();
    element.comment = literal.comment.clone();
    element.sister_codes = literal.sister_codes.clone();
    element.sub_items = literal.sub_items.clone();
    top.elements.push(element);
    Ok(())
}

/// Copy every non-handling flag of the top metadata.
fn apply_top_meta(top: &mut ClassificationTop, meta: &TopMetaDefinition) {
    top.top_comment = Some(meta.top_comment.clone()).filter(|comment| !comment.is_empty());
    top.code_type = meta.code_type.clone();
    top.check_implicit_set = meta.check_implicit_set.unwrap_or(false);
    top.check_selected_classification = meta.check_selected_classification.unwrap_or(false);
    top.force_classification_setting = meta.force_classification_setting.unwrap_or(false);
    top.use_document_only = meta.use_document_only.unwrap_or(false);
    top.suppress_auto_deploy = meta.suppress_auto_deploy.unwrap_or(false);
    top.suppress_db_access_class = meta.suppress_db_access_class.unwrap_or(false);
    top.deprecated = meta.deprecated.unwrap_or(false);
    top.grouping_map = meta.grouping_map.clone();
    top.deprecated_map = meta.deprecated_map.clone();
    top.related_column_name = meta.related_column_name.clone();
}

fn remove_document_only(model: &mut ClassificationModel) {
    let removed: Vec<String> = model
        .iter()
        .filter(|top| top.use_document_only)
        .map(|top| top.name.clone())
        .collect();
    for name in removed {
        debug!(classification = %name, "removing documentation-only classification");
        model.tops.shift_remove(&name);
        model.document_only_names.insert(name);
    }
    for top in model.tops.values_mut() {
        top.grouping_map.retain(|_, group| !group.use_document_only);
    }
}

fn validate_references(model: &ClassificationModel) -> Result<()> {
    for top in model.iter() {
        for (group, definition) in &top.grouping_map {
            if let Some(element) = definition
                .element_names
                .iter()
                .find(|element| top.find_by_name(element).is_none())
            {
                return Err(ClassificationError::UnknownGroupingElement {
                    classification: top.name.clone(),
                    group: group.clone(),
                    element: element.clone(),
                });
            }
        }
        if let Some(element) = top
            .deprecated_map
            .keys()
            .find(|element| top.find_by_name(element).is_none())
        {
            return Err(ClassificationError::UnknownDeprecatedElement {
                classification: top.name.clone(),
                element: element.clone(),
            });
        }
    }
    Ok(())
}

fn collect_suppressed_tables(model: &mut ClassificationModel) {
    let tables: Vec<String> = model
        .table_classifications()
        .flat_map(|top| {
            top.table_sources
                .iter()
                .filter(move |source| top.suppress_db_access_class || source.suppress_db_access_class)
                .map(|source| source.table.clone())
        })
        .collect();
    for table in tables {
        model.db_access_suppressed_tables.insert_if_absent(table, ());
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use cdef_definition::parse_definition_str;
    use cdef_model::{HandlingCompatibility, UndefinedHandlingType};

    use super::*;
    use crate::database::NoDatabase;

    fn definitions(toml: &str) -> ClassificationDefinitions {
        let raw = parse_definition_str(toml, Path::new("test.toml")).expect("parse");
        ClassificationDefinitions::from_raw(&raw).expect("definitions")
    }

    fn build(toml: &str) -> Result<ClassificationModel> {
        ModelBuilder::new(HandlingResolver::default(), &NoDatabase).build(&definitions(toml), Vec::new())
    }

    #[test]
    fn literal_classifications_keep_order_and_flags() {
        let model = build(
            r#"
[[Flg]]
topComment = "general boolean"
codeType = "Number"
checkImplicitSet = true
[[Flg]]
code = "1"
name = "True"
alias = "Yes"
[[Flg]]
code = "0"
name = "False"
"#,
        )
        .expect("model");
        let flg = model.get("Flg").expect("Flg");
        assert_eq!(flg.origin, ClassificationOrigin::Literal);
        assert_eq!(flg.top_comment.as_deref(), Some("general boolean"));
        assert_eq!(flg.undefined_handling_type, UndefinedHandlingType::Exception);
        assert!(flg.check_classification_code);
        assert!(!flg.is_table_classification);
        let names: Vec<&str> = flg.element_names().collect();
        assert_eq!(names, vec!["True", "False"]);
    }

    #[test]
    fn later_top_meta_overwrites_earlier() {
        let model = build(
            r#"
[[Flg]]
topComment = "first"
undefinedHandlingType = "ALLOWED"
[[Flg]]
topComment = "second"
[[Flg]]
code = "1"
name = "True"
"#,
        )
        .expect("model");
        let flg = model.get("Flg").expect("Flg");
        assert_eq!(flg.top_comment.as_deref(), Some("second"));
        assert_eq!(flg.undefined_handling_type, UndefinedHandlingType::Logging);
    }

    #[test]
    fn duplicate_literal_code_is_fatal() {
        let error = build("[[Flg]]\ncode = \"1\"\nname = \"True\"\n[[Flg]]\ncode = \"1\"\nname = \"Yes\"\n")
            .unwrap_err();
        assert!(matches!(error, ClassificationError::DuplicateElementCode { ref code, .. } if code == "1"));
    }

    #[test]
    fn explicit_check_flag_overrides_handling() {
        let model = build(
            "[[Flg]]\ntopComment = \"x\"\nundefinedHandlingType = \"LOGGING\"\ncheckClassificationCode = false\n[[Flg]]\ncode = \"1\"\nname = \"True\"\n",
        )
        .expect("model");
        let flg = model.get("Flg").expect("Flg");
        assert_eq!(flg.undefined_handling_type, UndefinedHandlingType::Logging);
        assert!(!flg.check_classification_code);
    }

    #[test]
    fn unknown_handling_code_is_fatal() {
        let error = build("[[Flg]]\ntopComment = \"x\"\nundefinedHandlingType = \"IGNORE\"\n").unwrap_err();
        assert!(matches!(error, ClassificationError::UnknownHandlingType { .. }));
    }

    #[test]
    fn resource_duplicate_is_fatal() {
        let resource = ClassificationTop::new(
            "Flg",
            ClassificationOrigin::Resource,
            UndefinedHandlingType::Logging,
        );
        let error = ModelBuilder::new(HandlingResolver::default(), &NoDatabase)
            .build(&definitions("[[Flg]]\ncode = \"1\"\nname = \"True\"\n"), vec![resource])
            .unwrap_err();
        match error {
            ClassificationError::DuplicateClassification {
                name,
                existing,
                duplicate,
            } => {
                assert_eq!(name, "Flg");
                assert_eq!(existing, ClassificationOrigin::Literal);
                assert_eq!(duplicate, ClassificationOrigin::Resource);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn document_only_classifications_are_removed_outside_documentation_runs() {
        let toml = r#"
[[Secret]]
topComment = "docs only"
isUseDocumentOnly = true
[[Secret]]
code = "S"
name = "Secret"

[[Flg]]
topComment = "boolean"
[Flg.groupingMap.docOnly]
elementList = ["True"]
isUseDocumentOnly = true
[[Flg]]
code = "1"
name = "True"
"#;
        let model = build(toml).expect("model");
        assert!(!model.contains("Secret"));
        assert!(model.is_document_only("Secret"));
        assert!(model.get("Flg").expect("Flg").grouping_map.is_empty());

        let documentation = ModelBuilder::new(HandlingResolver::default(), &NoDatabase)
            .documentation_run(true)
            .build(&definitions(toml), Vec::new())
            .expect("model");
        assert!(documentation.contains("Secret"));
        assert!(documentation.document_only_names.is_empty());
    }

    #[test]
    fn grouping_and_deprecated_names_are_validated() {
        let error = build(
            "[[Flg]]\ntopComment = \"x\"\n[Flg.groupingMap.positive]\nelementList = [\"Yes\"]\n[[Flg]]\ncode = \"1\"\nname = \"True\"\n",
        )
        .unwrap_err();
        assert!(matches!(
            error,
            ClassificationError::UnknownGroupingElement { ref element, .. } if element == "Yes"
        ));

        let error = build(
            "[[Flg]]\ntopComment = \"x\"\n[Flg.deprecatedMap]\nMaybe = \"use True\"\n[[Flg]]\ncode = \"1\"\nname = \"True\"\n",
        )
        .unwrap_err();
        assert!(matches!(error, ClassificationError::UnknownDeprecatedElement { .. }));
    }

    #[test]
    fn table_source_without_database_fails_with_connection_error() {
        let error = build("[[OrderStatus]]\ntable = \"ORDER_STATUS\"\ncode = \"STATUS_CODE\"\nname = \"STATUS_NAME\"\n")
            .unwrap_err();
        assert!(error.is_sql_failure());
    }

    #[test]
    fn legacy_compatibility_feeds_plain_handling() {
        let model = ModelBuilder::new(HandlingResolver::new(HandlingCompatibility::Legacy), &NoDatabase)
            .build(&definitions("[[Flg]]\ncode = \"1\"\nname = \"True\"\n"), Vec::new())
            .expect("model");
        assert_eq!(
            model.get("Flg").expect("Flg").undefined_handling_type,
            UndefinedHandlingType::Exception
        );
    }
}
