use metaform_model::{
    Context, DecodeChain, DecodeError, DecodeReport, EncodeError, EncodeRequest, Identifier, Meta,
    MetaDecode, MetaEncode, MetaService, Scalar, ServiceError, decode_meta,
};
use pretty_assertions::assert_eq;

#[derive(Debug, Default, PartialEq)]
struct User {
    id: i64,
    name: String,
    tags: Vec<String>,
}

// ── A hand-written decoder/encoder pair ──────────────────────────

struct UserDecode;

impl MetaDecode<User> for UserDecode {
    fn decode(
        &self,
        identifier: &Identifier,
        value: &Meta,
        target: &mut User,
        _context: &Context,
    ) -> Result<bool, DecodeError> {
        let invalid = |reason: &str| DecodeError::InvalidValue {
            identifier: identifier.clone(),
            reason: reason.to_string(),
        };
        match identifier.as_str() {
            "id" => match value.as_scalar() {
                Some(Scalar::Int(id)) => target.id = *id,
                _ => return Err(invalid("expected an integer")),
            },
            "name" => match value.as_scalar() {
                Some(Scalar::Text(name)) => target.name = name.clone(),
                _ => return Err(invalid("expected text")),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }
}

struct TagsDecode;

impl MetaDecode<User> for TagsDecode {
    fn decode(
        &self,
        identifier: &Identifier,
        value: &Meta,
        target: &mut User,
        _context: &Context,
    ) -> Result<bool, DecodeError> {
        if identifier != "tags" {
            return Ok(false);
        }
        let Meta::Collection { items, .. } = value else {
            return Err(DecodeError::InvalidValue {
                identifier: identifier.clone(),
                reason: "expected a collection".into(),
            });
        };
        let mut tags = Vec::with_capacity(items.len());
        for item in items {
            match item.as_scalar() {
                Some(Scalar::Text(tag)) => tags.push(tag.clone()),
                _ => {
                    return Err(DecodeError::InvalidValue {
                        identifier: identifier.clone(),
                        reason: "tags must be text".into(),
                    });
                }
            }
        }
        target.tags = tags;
        Ok(true)
    }
}

struct UserEncode;

impl MetaEncode<User> for UserEncode {
    fn encode(
        &self,
        request: EncodeRequest<'_, User>,
        _context: &Context,
    ) -> Result<Option<Meta>, EncodeError> {
        let Some(user) = request.object() else {
            return Ok(Some(Meta::object(
                "user",
                [
                    Meta::value("id", 0i64),
                    Meta::value("name", ""),
                    Meta::collection("tags", [Meta::item("")]),
                ],
            )));
        };
        let mut properties = vec![Meta::value("id", user.id), Meta::value("name", user.name.as_str())];
        if !user.tags.is_empty() {
            properties.push(Meta::collection(
                "tags",
                user.tags.iter().map(|t| Meta::item(t.as_str())),
            ));
        }
        Ok(Some(Meta::object("user", properties)))
    }
}

struct UserService;

impl MetaService<User> for UserService {
    fn create_decode(&self, _context: &Context) -> Result<Box<dyn MetaDecode<User>>, ServiceError> {
        Ok(Box::new(DecodeChain::<User>::new().with(Box::new(UserDecode)).with(Box::new(TagsDecode))))
    }

    fn create_encode(&self, context: &Context) -> Result<Option<Box<dyn MetaEncode<User>>>, ServiceError> {
        match context.get_str("operation") {
            Some("delete") => Ok(None),
            Some(_) => Ok(Some(Box::new(UserEncode))),
            None => Err(ServiceError::UnsupportedContext("missing `operation`".into())),
        }
    }
}

fn ctx(operation: &str) -> Context {
    Context::builder().with("operation", operation).build()
}

// ── Decoding ─────────────────────────────────────────────────────

#[test]
fn recognized_identifiers_populate_the_target() {
    let meta = Meta::object("user", [Meta::value("id", 1), Meta::value("name", "a")]);
    let mut user = User::default();
    let context = ctx("read");

    for property in meta.children() {
        let id = property.identifier().unwrap();
        assert!(UserDecode.decode(id, property, &mut user, &context).unwrap());
    }
    assert_eq!(user.id, 1);
    assert_eq!(user.name, "a");
}

#[test]
fn unrecognized_identifier_returns_false_without_mutation() {
    let mut user = User {
        id: 7,
        name: "keep".into(),
        tags: vec![],
    };
    let extra = Meta::value("extra", "x");
    let decoded = UserDecode
        .decode(&"extra".into(), &extra, &mut user, &ctx("read"))
        .unwrap();

    assert!(!decoded);
    assert_eq!(
        user,
        User {
            id: 7,
            name: "keep".into(),
            tags: vec![]
        }
    );
}

#[test]
fn malformed_value_for_known_identifier_is_an_error() {
    let mut user = User::default();
    let err = UserDecode
        .decode(&"id".into(), &Meta::value("id", "one"), &mut user, &ctx("read"))
        .unwrap_err();
    assert_eq!(err.to_string(), "invalid value for `id`: expected an integer");
}

#[test]
fn decode_meta_reports_every_identifier() {
    let meta = Meta::object(
        "user",
        [
            Meta::value("id", 1),
            Meta::value("name", "a"),
            Meta::value("extra", true),
            Meta::item("loose"),
        ],
    );
    let mut user = User::default();
    let report = decode_meta(&UserDecode, &meta, &mut user, &ctx("read")).unwrap();

    assert_eq!(
        report,
        DecodeReport {
            decoded: vec!["id".into(), "name".into()],
            unrecognized: vec!["extra".into()],
            skipped: 1,
        }
    );
    assert!(!report.is_complete());
}

#[test]
fn decode_meta_feeds_a_single_node() {
    let mut user = User::default();
    let report = decode_meta(&UserDecode, &Meta::value("name", "solo"), &mut user, &ctx("read")).unwrap();
    assert!(report.is_complete());
    assert_eq!(user.name, "solo");
}

#[test]
fn decode_meta_stops_at_first_error() {
    let meta = Meta::object("user", [Meta::value("id", "bad"), Meta::value("name", "a")]);
    let mut user = User::default();
    assert!(decode_meta(&UserDecode, &meta, &mut user, &ctx("read")).is_err());
    assert_eq!(user.name, "");
}

#[test]
fn chain_tries_decoders_in_order() {
    let chain = DecodeChain::<User>::new()
        .with(Box::new(UserDecode))
        .with(Box::new(TagsDecode));
    assert_eq!(chain.len(), 2);

    let meta = Meta::object(
        "user",
        [
            Meta::value("name", "a"),
            Meta::collection("tags", [Meta::item("x"), Meta::item("y")]),
        ],
    );
    let mut user = User::default();
    let report = decode_meta(&chain, &meta, &mut user, &ctx("read")).unwrap();

    assert!(report.is_complete());
    assert_eq!(user.tags, vec!["x".to_string(), "y".to_string()]);
}

#[test]
fn empty_chain_recognizes_nothing() {
    let chain: DecodeChain<User> = DecodeChain::default();
    assert!(chain.is_empty());
    let mut user = User::default();
    assert!(!chain.decode(&"id".into(), &Meta::value("id", 1), &mut user, &ctx("read")).unwrap());
}

// ── Services and round trips ─────────────────────────────────────

#[test]
fn encode_then_decode_round_trips() {
    let service = UserService;
    let context = ctx("read");
    let original = User {
        id: 42,
        name: "ann".into(),
        tags: vec!["admin".into(), "ops".into()],
    };

    let encoder = service.create_encode(&context).unwrap().unwrap();
    let meta = encoder.encode(EncodeRequest::Object(&original), &context).unwrap().unwrap();

    let decoder = service.create_decode(&context).unwrap();
    let mut restored = User::default();
    decode_meta(decoder.as_ref(), &meta, &mut restored, &context).unwrap();

    assert_eq!(restored, original);
}

#[test]
fn encode_is_repeatable() {
    let user = User {
        id: 1,
        name: "a".into(),
        tags: vec![],
    };
    let context = ctx("read");
    let first = UserEncode.encode(EncodeRequest::Object(&user), &context).unwrap();
    let second = UserEncode.encode(EncodeRequest::Object(&user), &context).unwrap();
    assert_eq!(first, second);
}

#[test]
fn sample_encode_yields_a_structural_sample() {
    let sample = UserEncode
        .encode(EncodeRequest::Sample, &ctx("read"))
        .unwrap()
        .unwrap();
    assert!(sample.find("id").is_some());
    assert!(sample.find("tags").is_some());
}

#[test]
fn write_only_operation_skips_encoding() {
    let service = UserService;
    assert!(service.create_encode(&ctx("delete")).unwrap().is_none());
}

#[test]
fn missing_operation_is_unsupported() {
    let err = UserService.create_encode(&Context::default()).err().unwrap();
    assert_eq!(err, ServiceError::UnsupportedContext("missing `operation`".into()));
}
