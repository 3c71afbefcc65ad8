//! End-to-end transcoding tests through the public reader surface.

use std::sync::Arc;

use rstest::rstest;

use crate::{
    EventKind, JsonTokenReader, JsonXmlReader, SchemaNode, TranscodeError, ValueType, XmlEvent,
};

const NS: &str = "http://www.w3schools.com";

fn reader<'a>(json: &'a str, root: &Arc<SchemaNode>) -> JsonXmlReader<JsonTokenReader<'a>> {
    JsonXmlReader::new(JsonTokenReader::new(json), Arc::clone(root))
}

/// Serializes the event stream the way a downstream XML writer would, with
/// the default namespace declared on the root element.
fn render(json: &str, root: &Arc<SchemaNode>) -> Result<String, TranscodeError> {
    let mut out = String::new();
    let mut depth = 0usize;
    for event in reader(json, root).into_events() {
        match event? {
            XmlEvent::StartDocument | XmlEvent::EndDocument => {}
            XmlEvent::StartElement {
                local_name,
                namespace_uri,
            } => {
                out.push('<');
                out.push_str(&local_name);
                if depth == 0 {
                    out.push_str(" xmlns=\"");
                    out.push_str(&namespace_uri);
                    out.push('"');
                }
                out.push('>');
                depth += 1;
            }
            XmlEvent::Characters { text } => {
                if let Some(text) = text {
                    out.push_str(&text);
                }
            }
            XmlEvent::EndElement { local_name, .. } => {
                out.push_str("</");
                out.push_str(&local_name);
                out.push('>');
                depth -= 1;
            }
        }
    }
    Ok(out)
}

fn person_service_root() -> Arc<SchemaNode> {
    SchemaNode::object(
        "response",
        NS,
        vec![SchemaNode::object(
            "return",
            NS,
            vec![
                SchemaNode::leaf("name", NS, ValueType::String),
                SchemaNode::leaf("age", NS, ValueType::Int),
                SchemaNode::leaf("gender", NS, ValueType::String),
            ],
        )],
    )
}

#[test]
fn transcodes_a_simple_response() {
    let json = r#"{"response":{"return":{"name":"kate","age":35,"gender":"female"}}}"#;
    assert_eq!(
        render(json, &person_service_root()).unwrap(),
        "<response xmlns=\"http://www.w3schools.com\">\
         <return><name>kate</name><age>35</age><gender>female</gender></return>\
         </response>"
    );
}

#[test]
fn members_in_json_order_not_schema_order() {
    let json = r#"{"response":{"return":{"gender":"female","age":35,"name":"kate"}}}"#;
    assert_eq!(
        render(json, &person_service_root()).unwrap(),
        "<response xmlns=\"http://www.w3schools.com\">\
         <return><gender>female</gender><age>35</age><name>kate</name></return>\
         </response>"
    );
}

#[test]
fn coerces_each_declared_value_type() {
    let root = SchemaNode::object(
        "house",
        NS,
        vec![
            SchemaNode::leaf("homes", NS, ValueType::Int),
            SchemaNode::leaf("age", NS, ValueType::Int),
            SchemaNode::leaf("height", NS, ValueType::Double),
            SchemaNode::leaf("image", NS, ValueType::Base64Binary),
            SchemaNode::leaf("sold", NS, ValueType::Boolean),
        ],
    );
    let json = r#"{"house":{"homes":1,"age":23,"height":5.5,"image":"aGVsbG8=","sold":true}}"#;
    assert_eq!(
        render(json, &root).unwrap(),
        "<house xmlns=\"http://www.w3schools.com\">\
         <homes>1</homes><age>23</age><height>5.5</height>\
         <image>aGVsbG8=</image><sold>true</sold></house>"
    );
}

fn batch_root() -> Arc<SchemaNode> {
    SchemaNode::object(
        "employees",
        NS,
        vec![SchemaNode::array(
            "employees",
            NS,
            vec![
                SchemaNode::leaf("firstName", NS, ValueType::String),
                SchemaNode::leaf("lastName", NS, ValueType::String),
                SchemaNode::leaf("age", NS, ValueType::Int),
            ],
        )],
    )
}

#[test]
fn flattens_an_array_of_objects_into_repeated_elements() {
    let json = r#"{"employees":{"employees":[
        {"firstName":"ann","lastName":"lee","age":30},
        {"firstName":"bob","lastName":"ray","age":40}
    ]}}"#;
    assert_eq!(
        render(json, &batch_root()).unwrap(),
        "<employees xmlns=\"http://www.w3schools.com\">\
         <employees><firstName>ann</firstName><lastName>lee</lastName><age>30</age></employees>\
         <employees><firstName>bob</firstName><lastName>ray</lastName><age>40</age></employees>\
         </employees>"
    );
}

#[test]
fn later_array_items_may_reorder_members() {
    // The second item arrives in a different member order than the first;
    // the replay match still resolves every name.
    let json = r#"{"employees":{"employees":[
        {"firstName":"ann","lastName":"lee","age":30},
        {"age":40,"firstName":"bob","lastName":"ray"}
    ]}}"#;
    assert_eq!(
        render(json, &batch_root()).unwrap(),
        "<employees xmlns=\"http://www.w3schools.com\">\
         <employees><firstName>ann</firstName><lastName>lee</lastName><age>30</age></employees>\
         <employees><age>40</age><firstName>bob</firstName><lastName>ray</lastName></employees>\
         </employees>"
    );
}

#[test]
fn flattens_a_scalar_array_into_repeated_leaves() {
    let root = SchemaNode::object(
        "response",
        NS,
        vec![SchemaNode::leaf("nums", NS, ValueType::Int)],
    );
    assert_eq!(
        render(r#"{"response":{"nums":[1,2,3]}}"#, &root).unwrap(),
        "<response xmlns=\"http://www.w3schools.com\">\
         <nums>1</nums><nums>2</nums><nums>3</nums></response>"
    );
}

#[test]
fn null_leaf_renders_an_empty_element() {
    let json = r#"{"response":{"return":{"name":null,"age":35,"gender":"female"}}}"#;
    assert_eq!(
        render(json, &person_service_root()).unwrap(),
        "<response xmlns=\"http://www.w3schools.com\">\
         <return><name></name><age>35</age><gender>female</gender></return>\
         </response>"
    );
}

#[test]
fn unknown_member_reports_a_schema_mismatch() {
    let json = r#"{"response":{"return":{"name":"kate","salary":10}}}"#;
    assert_eq!(
        render(json, &person_service_root()),
        Err(TranscodeError::SchemaMismatch {
            name: "salary".to_owned()
        })
    );
}

#[test]
fn wrong_value_kind_reports_a_type_mismatch() {
    let json = r#"{"response":{"return":{"name":"kate","age":"old"}}}"#;
    let err = render(json, &person_service_root()).unwrap_err();
    assert_eq!(
        err,
        TranscodeError::TypeMismatch {
            name: "age".to_owned(),
            expected: "int",
            found: crate::TokenKind::String,
        }
    );
}

#[test]
fn malformed_json_surfaces_the_source_position() {
    let json = "{\"response\":{\"return\":{\"name\":\"kate\"";
    let err = render(json, &person_service_root()).unwrap_err();
    let TranscodeError::TokenSource(source) = err else {
        panic!("expected a token source error, got {err}");
    };
    assert_eq!((source.line, source.column), (1, 37));
}

#[rstest]
#[case(ValueType::Int, "35", "35")]
#[case(ValueType::Long, "-7", "-7")]
#[case(ValueType::Double, "5.5", "5.5")]
#[case(ValueType::Boolean, "false", "false")]
#[case(ValueType::String, "\"hi\"", "hi")]
fn renders_each_scalar_type(
    #[case] declared: ValueType,
    #[case] literal: &str,
    #[case] rendered: &str,
) {
    let root = SchemaNode::object("r", NS, vec![SchemaNode::leaf("v", NS, declared)]);
    let json = format!("{{\"r\":{{\"v\":{literal}}}}}");
    assert_eq!(
        render(&json, &root).unwrap(),
        format!("<r xmlns=\"http://www.w3schools.com\"><v>{rendered}</v></r>")
    );
}

#[test]
fn transcoding_is_deterministic() {
    let json = r#"{"employees":{"employees":[
        {"firstName":"ann","lastName":"lee","age":30},
        {"firstName":"bob","lastName":"ray","age":40}
    ]}}"#;
    let root = batch_root();
    assert_eq!(render(json, &root).unwrap(), render(json, &root).unwrap());
}

#[test]
fn reader_reports_exhaustion_after_end_document() {
    let root = person_service_root();
    let mut reader = reader(
        r#"{"response":{"return":{"name":"kate","age":35,"gender":"female"}}}"#,
        &root,
    );
    while reader.has_next() {
        reader.next_event().unwrap();
    }
    assert_eq!(reader.event_type(), EventKind::EndDocument);
    assert_eq!(reader.next_event(), Err(TranscodeError::NoMoreEvents));
}

#[test]
fn nested_arrays_flatten_at_each_level() {
    let root = SchemaNode::object(
        "company",
        NS,
        vec![SchemaNode::array(
            "teams",
            NS,
            vec![
                SchemaNode::leaf("name", NS, ValueType::String),
                SchemaNode::array(
                    "members",
                    NS,
                    vec![SchemaNode::leaf("id", NS, ValueType::Int)],
                ),
            ],
        )],
    );
    let json = r#"{"company":{"teams":[
        {"name":"core","members":[{"id":1},{"id":2}]},
        {"name":"web","members":[{"id":3}]}
    ]}}"#;
    assert_eq!(
        render(json, &root).unwrap(),
        "<company xmlns=\"http://www.w3schools.com\">\
         <teams><name>core</name><members><id>1</id></members><members><id>2</id></members></teams>\
         <teams><name>web</name><members><id>3</id></members></teams>\
         </company>"
    );
}
