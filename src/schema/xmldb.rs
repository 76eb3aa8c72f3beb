//! Moodle XMLDB (`install.xml`) schema definitions.
//!
//! ```xml
//! <XMLDB PATH="mod/forum/db">
//!   <TABLES>
//!     <TABLE NAME="forum_posts">
//!       <FIELDS>
//!         <FIELD NAME="id" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="true"/>
//!         <FIELD NAME="discussion" TYPE="int" LENGTH="10" NOTNULL="true"/>
//!       </FIELDS>
//!       <KEYS>
//!         <KEY NAME="primary" TYPE="primary" FIELDS="id"/>
//!         <KEY NAME="discussion" TYPE="foreign" FIELDS="discussion" REFTABLE="forum_discussions" REFFIELDS="id"/>
//!       </KEYS>
//!     </TABLE>
//!   </TABLES>
//! </XMLDB>
//! ```

use super::{Field, FieldType, Key, KeyKind, Schema, Table};
use roxmltree::{Document, Node};
use std::path::Path;
use tracing::debug;

/// Parse an XMLDB document.
///
/// The component comes from the file location (`<type>/<name>/db/install.xml`),
/// falling back to the root element's `PATH` attribute.
pub fn parse_xmldb(content: &str, origin: &Path) -> Result<Schema, roxmltree::Error> {
    let doc = Document::parse(content)?;
    let root = doc.root_element();

    let component = component_from_install_path(origin)
        .or_else(|| root.attribute("PATH").and_then(component_from_db_path));

    let tables = root
        .descendants()
        .filter(|n| n.has_tag_name("TABLE"))
        .filter_map(parse_table)
        .collect();

    Ok(Schema { component, tables })
}

fn parse_table(node: Node<'_, '_>) -> Option<Table> {
    let Some(name) = node.attribute("NAME") else {
        debug!("TABLE without NAME skipped");
        return None;
    };
    let mut table = Table::new(name);

    for child in node.descendants().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "FIELD" => {
                if let Some(field) = parse_field(child) {
                    table.fields.push(field);
                }
            }
            "KEY" => {
                if let Some(key) = parse_key(child) {
                    table.keys.push(key);
                }
            }
            _ => {}
        }
    }

    Some(table)
}

fn parse_field(node: Node<'_, '_>) -> Option<Field> {
    let name = node.attribute("NAME")?;
    let field_type = node
        .attribute("TYPE")
        .map(FieldType::from_name)
        .unwrap_or_default();
    Some(Field::new(name, field_type))
}

fn parse_key(node: Node<'_, '_>) -> Option<Key> {
    let name = node.attribute("NAME")?;
    let kind = KeyKind::from(node.attribute("TYPE").unwrap_or_default().to_string());
    let ref_table = node
        .attribute("REFTABLE")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Some(Key {
        name: name.to_string(),
        kind,
        fields: split_field_list(node.attribute("FIELDS")),
        ref_table,
        ref_fields: split_field_list(node.attribute("REFFIELDS")),
    })
}

/// XMLDB stores field lists as `a, b, c`
fn split_field_list(list: Option<&str>) -> Vec<String> {
    list.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// `mod/forum/db` -> `mod/forum`
fn component_from_db_path(path: &str) -> Option<String> {
    let path = path.trim().trim_end_matches('/');
    let component = path.strip_suffix("/db").unwrap_or(path);
    (!component.is_empty()).then(|| component.to_string())
}

/// `.../mod/forum/db/install.xml` -> `mod/forum`
fn component_from_install_path(path: &Path) -> Option<String> {
    let db = path.parent()?;
    if db.file_name()?.to_str()? != "db" {
        return None;
    }
    let plugin = db.parent()?;
    let name = plugin.file_name()?.to_str()?;
    let plugin_type = plugin.parent()?.file_name()?.to_str()?;
    Some(format!("{}/{}", plugin_type, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORUM_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<XMLDB PATH="mod/forum/db" VERSION="20240101" COMMENT="XMLDB file for Moodle mod/forum"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xsi:noNamespaceSchemaLocation="../../../lib/xmldb/xmldb.xsd"
>
  <TABLES>
    <TABLE NAME="forum" COMMENT="Forums contain and structure discussion">
      <FIELDS>
        <FIELD NAME="id" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="true"/>
        <FIELD NAME="course" TYPE="int" LENGTH="10" NOTNULL="true" DEFAULT="0" SEQUENCE="false"/>
        <FIELD NAME="name" TYPE="char" LENGTH="255" NOTNULL="true" SEQUENCE="false"/>
        <FIELD NAME="timemodified" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="false"/>
      </FIELDS>
      <KEYS>
        <KEY NAME="primary" TYPE="primary" FIELDS="id"/>
        <KEY NAME="course" TYPE="foreign" FIELDS="course" REFTABLE="course" REFFIELDS="id"/>
      </KEYS>
      <INDEXES>
        <INDEX NAME="course" UNIQUE="false" FIELDS="course"/>
      </INDEXES>
    </TABLE>
    <TABLE NAME="forum_grades">
      <FIELDS>
        <FIELD NAME="id" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="true"/>
        <FIELD NAME="forum" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="false"/>
        <FIELD NAME="itemnumber" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="false"/>
        <FIELD NAME="grade" TYPE="number" LENGTH="10" DECIMALS="5" SEQUENCE="false"/>
      </FIELDS>
      <KEYS>
        <KEY NAME="primary" TYPE="primary" FIELDS="id"/>
        <KEY NAME="forum" TYPE="foreign" FIELDS="forum" REFTABLE="forum" REFFIELDS="id"/>
        <KEY NAME="uniq" TYPE="unique" FIELDS="forum, itemnumber"/>
      </KEYS>
    </TABLE>
  </TABLES>
</XMLDB>
"#;

    #[test]
    fn test_parse_tables_fields_and_keys() {
        let schema = parse_xmldb(FORUM_XML, Path::new("install.xml")).unwrap();

        assert_eq!(schema.component.as_deref(), Some("mod/forum"));
        assert_eq!(schema.len(), 2);

        let forum = schema.get_table("forum").unwrap();
        assert_eq!(forum.fields.len(), 4);
        assert_eq!(forum.get_field("name").unwrap().field_type, FieldType::Char);
        assert_eq!(forum.keys.len(), 2);
        assert!(forum.keys[0].is_primary());
        assert_eq!(forum.keys[1].ref_table.as_deref(), Some("course"));
        assert_eq!(forum.keys[1].ref_fields, vec!["id"]);

        let grades = schema.get_table("forum_grades").unwrap();
        assert_eq!(grades.get_field("grade").unwrap().field_type, FieldType::Number);
        assert_eq!(grades.keys[2].kind, KeyKind::Other);
        assert_eq!(grades.keys[2].fields, vec!["forum", "itemnumber"]);
        assert!(grades.keys[2].ref_table.is_none());
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_component_from_install_location() {
        let schema =
            parse_xmldb(FORUM_XML, Path::new("/srv/moodle/mod/quiz/db/install.xml")).unwrap();
        assert_eq!(schema.component.as_deref(), Some("mod/quiz"));

        assert_eq!(
            component_from_install_path(Path::new("blocks/html/db/install.xml")),
            Some("blocks/html".to_string())
        );
        assert_eq!(component_from_install_path(Path::new("/tmp/install.xml")), None);
        assert_eq!(component_from_db_path("lib/db/"), Some("lib".to_string()));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(parse_xmldb("<XMLDB><TABLES>", Path::new("install.xml")).is_err());
    }
}
