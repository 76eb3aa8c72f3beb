//! Integration tests for the graph/links commands.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn get_binary_path() -> String {
    std::env::var("CARGO_BIN_EXE_schema-erd")
        .unwrap_or_else(|_| "target/debug/schema-erd".to_string())
}

fn create_forum_schema(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("install.yaml");
    fs::write(
        &path,
        r#"
component: mod/forum
tables:
  - name: forum
    fields:
      - { name: id, type: integer }
      - { name: course, type: integer }
      - { name: name, type: char }
    keys:
      - { name: primary, kind: primary, fields: [id] }
      - { name: course, kind: foreign, fields: [course], reftable: course, reffields: [id] }
  - name: forum_discussions
    fields:
      - { name: id, type: integer }
      - { name: forum, type: integer }
      - { name: firstpost, type: integer }
    keys:
      - { name: primary, kind: primary, fields: [id] }
  - name: forum_posts
    fields:
      - { name: id, type: integer }
      - { name: discussion, type: integer }
      - { name: parent, type: integer }
      - { name: postid, type: integer }
    keys:
      - { name: primary, kind: primary, fields: [id] }
      - { name: discussion, kind: foreign, fields: [discussion], reftable: forum_discussions, reffields: [id] }
      - { name: parent, kind: foreign, fields: [parent], reftable: forum_posts, reffields: [id] }
"#,
    )
    .unwrap();
    path
}

fn create_sql_schema(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("schema.sql");
    fs::write(
        &path,
        r#"
CREATE TABLE book (
  id INT PRIMARY KEY,
  course BIGINT,
  name VARCHAR(255),
  FOREIGN KEY (course) REFERENCES course(id)
);

CREATE TABLE page (
  id INT PRIMARY KEY,
  bookid INT,
  content TEXT
);
"#,
    )
    .unwrap();
    path
}

fn create_xmldb_schema(dir: &TempDir) -> std::path::PathBuf {
    let db_dir = dir.path().join("mod").join("forum").join("db");
    fs::create_dir_all(&db_dir).unwrap();
    let path = db_dir.join("install.xml");
    fs::write(
        &path,
        r#"<?xml version="1.0" encoding="UTF-8" ?>
<XMLDB PATH="mod/forum/db" VERSION="20240101" COMMENT="XMLDB file for Moodle mod/forum">
  <TABLES>
    <TABLE NAME="forum">
      <FIELDS>
        <FIELD NAME="id" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="true"/>
        <FIELD NAME="course" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="false"/>
      </FIELDS>
      <KEYS>
        <KEY NAME="primary" TYPE="primary" FIELDS="id"/>
        <KEY NAME="course" TYPE="foreign" FIELDS="course" REFTABLE="course" REFFIELDS="id"/>
      </KEYS>
    </TABLE>
    <TABLE NAME="forum_posts">
      <FIELDS>
        <FIELD NAME="id" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="true"/>
        <FIELD NAME="parent" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="false"/>
        <FIELD NAME="postid" TYPE="int" LENGTH="10" NOTNULL="true" SEQUENCE="false"/>
        <FIELD NAME="created" TYPE="datetime" SEQUENCE="false"/>
      </FIELDS>
      <KEYS>
        <KEY NAME="primary" TYPE="primary" FIELDS="id"/>
        <KEY NAME="parent" TYPE="foreign" FIELDS="parent" REFTABLE="forum_posts" REFFIELDS="id"/>
      </KEYS>
    </TABLE>
  </TABLES>
</XMLDB>
"#,
    )
    .unwrap();
    path
}

#[test]
fn test_graph_from_xmldb_install_file() {
    let dir = TempDir::new().unwrap();
    let schema = create_xmldb_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["graph", schema.to_str().unwrap(), "--fields"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("forum:outcourse -> course;"));
    assert!(stdout.contains("forum_posts:inparent:w -> forum_posts:inid:w [minlen=1];"));
    // mod/forum gives the forum_ prefix, so postid resolves to forum_posts
    assert!(stdout.contains("forum_posts:inpostid:w -> forum_posts:inid:w [minlen=1, label=\"implied\""));
    assert!(stdout.contains("datetime</td>"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("prefix: forum_"));
}

#[test]
fn test_graph_dot_output_with_fields() {
    let dir = TempDir::new().unwrap();
    let schema = create_forum_schema(&dir);
    let output = dir.path().join("forum.dot");

    let status = Command::new(get_binary_path())
        .args([
            "graph",
            schema.to_str().unwrap(),
            "--fields",
            "-o",
            output.to_str().unwrap(),
        ])
        .status()
        .unwrap();

    assert!(status.success());
    let content = fs::read_to_string(&output).unwrap();
    assert!(content.starts_with("digraph component {"));
    assert!(content.contains("forum_posts:outdiscussion -> forum_discussions:inid;"));
    assert!(content.contains("forum_posts:inparent:w -> forum_posts:inid:w [minlen=1];"));
    assert!(content.contains("forum:outcourse -> course;"));
    assert!(content.contains("forum_discussions:outforum -> forum:inid [label=\"implied\""));
    assert!(content.contains("subgraph cluster_external"));
}

#[test]
fn test_graph_prefix_drives_plural_match() {
    let dir = TempDir::new().unwrap();
    let schema = create_forum_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["graph", schema.to_str().unwrap(), "--fields"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("forum_posts:inpostid:w -> forum_posts:inid:w [minlen=1, label=\"implied\""));

    let output = Command::new(get_binary_path())
        .args([
            "graph",
            schema.to_str().unwrap(),
            "--fields",
            "--component",
            "admin/tool/erdiagram",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("postid -> forum_posts"));
    assert!(!stdout.contains("inpostid:w"));
}

#[test]
fn test_graph_without_fields_from_sql() {
    let dir = TempDir::new().unwrap();
    let schema = create_sql_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["graph", schema.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("    book -> course;"));
    assert!(stdout.contains("    page -> book [label=\"implied\""));
    assert!(!stdout.contains("port="));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 declared links, 1 implied links, 1 external tables"));
}

#[test]
fn test_graph_no_infer() {
    let dir = TempDir::new().unwrap();
    let schema = create_sql_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["graph", schema.to_str().unwrap(), "--no-infer"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("implied"));
}

#[test]
fn test_graph_config_file() {
    let dir = TempDir::new().unwrap();
    let schema = create_sql_schema(&dir);
    let config = dir.path().join("erd.yaml");
    fs::write(&config, "fields: true\ninference:\n  integer_only: true\n").unwrap();

    let output = Command::new(get_binary_path())
        .args([
            "graph",
            schema.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
        ])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("port=\"outbookid\""));
    assert!(stdout.contains("page:outbookid -> book:inid"));
}

#[test]
fn test_links_json() {
    let dir = TempDir::new().unwrap();
    let schema = create_forum_schema(&dir);

    let output = Command::new(get_binary_path())
        .args(["links", schema.to_str().unwrap(), "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["component"], "mod/forum");
    assert_eq!(json["prefix"], "forum_");
    assert_eq!(json["external_tables"][0], "course");
    assert_eq!(json["stats"]["table_count"], 3);
    assert_eq!(json["stats"]["external_count"], 1);
}

#[test]
fn test_links_policy_flag() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("books.json");
    fs::write(
        &schema,
        r#"{"tables": [
            {"name": "book", "fields": [{"name": "id", "type": "integer"}]},
            {"name": "books", "fields": [{"name": "id", "type": "integer"}]},
            {"name": "page", "fields": [{"name": "bookid", "type": "integer"}]}
        ]}"#,
    )
    .unwrap();

    let output = Command::new(get_binary_path())
        .args(["links", schema.to_str().unwrap(), "--policy", "first"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("implied   page.bookid -> book.id"));

    let output = Command::new(get_binary_path())
        .args(["links", schema.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(String::from_utf8_lossy(&output.stdout).contains("implied   page.bookid -> books.id"));
}

#[test]
fn test_missing_schema_fails() {
    let output = Command::new(get_binary_path())
        .args(["graph", "/nonexistent/install.yaml"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("schema file does not exist"));
}

#[test]
fn test_duplicate_table_fails() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("dup.json");
    fs::write(
        &schema,
        r#"{"tables": [{"name": "book"}, {"name": "book"}]}"#,
    )
    .unwrap();

    let output = Command::new(get_binary_path())
        .args(["graph", schema.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("duplicate table 'book'"));
}
