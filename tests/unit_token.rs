use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use uuid::Uuid;

use practia::config::jwt::JwtConfig;
use practia::utils::token::{
    Claims, Scope, StudentClaims, TokenError, TokenPayload, TokenService, UserClaims, UserInvite,
};
use practia_core::{Permission, Role};

const TEST_SECRET: &str = "test_secret_key_for_testing_purposes";

fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        session_ttl: 86400,
        recovery_ttl: 3600,
        invite_ttl: 604800,
    }
}

fn token_service() -> TokenService {
    TokenService::new(&test_jwt_config())
}

fn sample_user_payload() -> TokenPayload {
    let now = Utc::now();
    TokenPayload::User(UserClaims {
        id: Uuid::new_v4(),
        name: "Test User".to_string(),
        email: "user@example.com".to_string(),
        role: Role::Member,
        permissions: vec![Permission::ViewCycle, Permission::EditVacancy],
        created_at: now,
        updated_at: now,
    })
}

fn sample_student_payload() -> TokenPayload {
    let now = Utc::now();
    TokenPayload::Student(StudentClaims {
        id: Uuid::new_v4(),
        name: "Test Student".to_string(),
        code: "A01234567".to_string(),
        career_id: Uuid::new_v4(),
        email: "student@example.com".to_string(),
        telephone: "+52-555-0100".to_string(),
        created_at: now,
        updated_at: now,
    })
}

fn all_sample_payloads() -> Vec<TokenPayload> {
    vec![
        sample_user_payload(),
        sample_student_payload(),
        TokenPayload::RecoverUserPassword { id: Uuid::new_v4() },
        TokenPayload::RecoverStudentPassword { id: Uuid::new_v4() },
        TokenPayload::InviteUser(UserInvite {
            name: "Invitee".to_string(),
            email: "invitee@example.com".to_string(),
            role: Role::Base,
            permissions: vec![Permission::InviteUser],
        }),
        TokenPayload::InviteStudent {
            email: "freshman@example.com".to_string(),
        },
    ]
}

#[test]
fn test_round_trip_preserves_every_payload_variant() {
    let tokens = token_service();

    for payload in all_sample_payloads() {
        let token = tokens.sign(payload.clone(), 3600).unwrap();
        let claims = tokens.verify(&token).unwrap();

        assert_eq!(claims.payload, payload);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.nbf, claims.iat);
    }
}

#[test]
fn test_scope_tags_on_the_wire() {
    let cases = [
        (sample_user_payload(), "user"),
        (sample_student_payload(), "student"),
        (
            TokenPayload::RecoverUserPassword { id: Uuid::new_v4() },
            "recover-user-password",
        ),
        (
            TokenPayload::RecoverStudentPassword { id: Uuid::new_v4() },
            "recover-student-password",
        ),
        (
            TokenPayload::InviteUser(UserInvite {
                name: "X".to_string(),
                email: "x@example.com".to_string(),
                role: Role::Base,
                permissions: vec![],
            }),
            "invite-user",
        ),
        (
            TokenPayload::InviteStudent {
                email: "y@example.com".to_string(),
            },
            "invite-student",
        ),
    ];

    for (payload, expected_tag) in cases {
        assert_eq!(payload.scope().as_str(), expected_tag);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["scope"], expected_tag);
    }
}

#[test]
fn test_zero_ttl_token_is_already_expired() {
    let tokens = token_service();

    let token = tokens.sign(sample_user_payload(), 0).unwrap();
    let err = tokens.verify(&token).unwrap_err();

    match err {
        TokenError::Expired { expired_at } => {
            // the error carries the expiry instant for display
            assert!(expired_at <= Utc::now());
        }
        other => panic!("expected Expired, got {other:?}"),
    }
}

#[test]
fn test_tampered_signature_is_rejected() {
    let tokens = token_service();
    let token = tokens.sign(sample_user_payload(), 3600).unwrap();

    let (head, signature) = token.rsplit_once('.').unwrap();
    let mut flipped = signature.to_string();
    let replacement = if flipped.starts_with('A') { "B" } else { "A" };
    flipped.replace_range(0..1, replacement);
    let tampered = format!("{head}.{flipped}");
    assert_ne!(tampered, token);

    assert_eq!(tokens.verify(&tampered).unwrap_err(), TokenError::Invalid);
}

#[test]
fn test_wrong_secret_is_rejected() {
    let tokens = token_service();
    let token = tokens.sign(sample_user_payload(), 3600).unwrap();

    let other = TokenService::new(&JwtConfig {
        secret: "a_completely_different_secret".to_string(),
        session_ttl: 86400,
        recovery_ttl: 3600,
        invite_ttl: 604800,
    });

    assert_eq!(other.verify(&token).unwrap_err(), TokenError::Invalid);
}

#[test]
fn test_garbage_tokens_are_rejected() {
    let tokens = token_service();

    for garbage in ["", "not.enough", "a.b.c", "!!!.???.###"] {
        assert_eq!(tokens.verify(garbage).unwrap_err(), TokenError::Invalid);
    }
}

#[test]
fn test_unknown_payload_shape_is_rejected() {
    // valid signature, but the payload carries no recognizable scope
    let now = Utc::now().timestamp();
    let token = jsonwebtoken::encode(
        &Header::default(),
        &serde_json::json!({
            "scope": "superpowers",
            "id": Uuid::new_v4(),
            "iat": now,
            "nbf": now,
            "exp": now + 3600,
        }),
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(
        token_service().verify(&token).unwrap_err(),
        TokenError::Invalid
    );
}

#[test]
fn test_future_nbf_is_not_yet_valid() {
    let now = Utc::now().timestamp();
    let claims = Claims {
        payload: sample_user_payload(),
        iat: now,
        nbf: now + 600,
        exp: now + 3600,
    };
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(
        token_service().verify(&token).unwrap_err(),
        TokenError::NotYetValid
    );
}

#[test]
fn test_student_token_is_not_a_user_token() {
    let tokens = token_service();

    let student_token = tokens.sign(sample_student_payload(), 3600).unwrap();
    let claims = tokens.verify(&student_token).unwrap();
    assert_eq!(claims.payload.scope(), Scope::Student);
    assert!(!matches!(claims.payload, TokenPayload::User(_)));

    let user_token = tokens.sign(sample_user_payload(), 3600).unwrap();
    let claims = tokens.verify(&user_token).unwrap();
    assert_eq!(claims.payload.scope(), Scope::User);
    assert!(!matches!(claims.payload, TokenPayload::Student(_)));
}
