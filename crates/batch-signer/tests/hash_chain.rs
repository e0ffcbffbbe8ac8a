use std::sync::Arc;
use std::time::Duration;

use batch_signer::signing::{MESSAGE, SIG_HASH_CHAIN_RESULT, SignatureDocument};
use batch_signer::{
    BatchSigner, BatchSignerConfig, Certificate, DigestAlgorithm, HashChainVerifier, MessagePart,
    Secp256k1Key, SignAlgorithm, SignatureData, SigningRequest, SoftwareToken, calculate_digest,
};
use k256::ecdsa::Signature;
use k256::ecdsa::signature::hazmat::PrehashVerifier;

const SEED: &str = "batch-signer-test-key";

fn signer() -> BatchSigner {
    let token = SoftwareToken::new(true).with_key("ec", Secp256k1Key::from_seed(SEED).unwrap());
    BatchSigner::new(Arc::new(token), BatchSignerConfig::new(Duration::from_secs(5)))
}

fn request(message: &str, attachments: &[&str]) -> SigningRequest {
    let mut parts = vec![MessagePart::message(
        MESSAGE,
        DigestAlgorithm::Sha256,
        message.as_bytes().to_vec(),
    )];
    parts.extend(attachments.iter().enumerate().map(|(i, attachment)| {
        MessagePart::new(
            format!("/attachment{}", i + 1),
            DigestAlgorithm::Sha256,
            calculate_digest(DigestAlgorithm::Sha256, attachment.as_bytes()),
        )
    }));
    SigningRequest::new(Certificate::from_der(b"member-cert".to_vec()), parts)
}

fn assert_signed_by_key(data: &SignatureData) {
    let document: SignatureDocument = serde_json::from_str(&data.signature).unwrap();
    let result = data.hash_chain_result.as_deref().unwrap();
    let result_digest = calculate_digest(DigestAlgorithm::Sha256, result.as_bytes());

    assert_eq!(document.reference.uri, SIG_HASH_CHAIN_RESULT);
    assert_eq!(document.reference.digest.digest_value, hex::encode(&result_digest));
    assert_eq!(document.signature_method, SignAlgorithm::EcdsaSha256.uri());

    let signature = Signature::from_slice(&hex::decode(&document.signature_value).unwrap()).unwrap();
    let key = Secp256k1Key::from_seed(SEED).unwrap();
    key.verifying_key().verify_prehash(&result_digest, &signature).unwrap();
}

#[tokio::test]
async fn batch_members_verify_independently() {
    let signer = signer();
    let requests = [
        request("first", &[]),
        request("second", &["attachment-a", "attachment-b"]),
        request("third", &["attachment-c"]),
    ];

    let (a, b, c) = tokio::join!(
        signer.sign("ec", SignAlgorithm::EcdsaSha256, requests[0].clone()),
        signer.sign("ec", SignAlgorithm::EcdsaSha256, requests[1].clone()),
        signer.sign("ec", SignAlgorithm::EcdsaSha256, requests[2].clone()),
    );
    let signatures = [a.unwrap(), b.unwrap(), c.unwrap()];

    for (data, request) in signatures.iter().zip(&requests) {
        assert!(data.is_batch_signature());
        assert_signed_by_key(data);
        HashChainVerifier::verify(
            data.hash_chain_result.as_deref().unwrap(),
            data.hash_chain.as_deref().unwrap(),
            &request.part_hashes(),
        )
        .unwrap();
    }

    // a fragment only proves its own request
    assert!(
        HashChainVerifier::verify(
            signatures[0].hash_chain_result.as_deref().unwrap(),
            signatures[0].hash_chain.as_deref().unwrap(),
            &requests[2].part_hashes(),
        )
        .is_err()
    );
}

#[tokio::test]
async fn attachments_force_hash_chain_for_single_request() {
    let signer = signer();
    let request = request("lonely", &["attachment-a"]);

    let data = signer
        .sign("ec", SignAlgorithm::EcdsaSha256, request.clone())
        .await
        .unwrap();

    assert!(data.is_batch_signature());
    assert_signed_by_key(&data);
    HashChainVerifier::verify(
        data.hash_chain_result.as_deref().unwrap(),
        data.hash_chain.as_deref().unwrap(),
        &request.part_hashes(),
    )
    .unwrap();
}

#[tokio::test]
async fn single_message_signature_covers_message() {
    let signer = signer();

    let data = signer
        .sign("ec", SignAlgorithm::EcdsaSha256, request("plain", &[]))
        .await
        .unwrap();

    assert!(!data.is_batch_signature());
    let document: SignatureDocument = serde_json::from_str(&data.signature).unwrap();
    let digest = calculate_digest(DigestAlgorithm::Sha256, b"plain");
    assert_eq!(document.reference.uri, MESSAGE);
    assert_eq!(document.reference.digest.digest_value, hex::encode(&digest));

    let signature = Signature::from_slice(&hex::decode(&document.signature_value).unwrap()).unwrap();
    let key = Secp256k1Key::from_seed(SEED).unwrap();
    key.verifying_key().verify_prehash(&digest, &signature).unwrap();
}

#[tokio::test]
async fn same_batch_renders_same_bytes() {
    let first = signer();
    let second = signer();

    let (a1, b1) = tokio::join!(
        first.sign("ec", SignAlgorithm::EcdsaSha256, request("x", &[])),
        first.sign("ec", SignAlgorithm::EcdsaSha256, request("y", &[])),
    );
    let (a2, b2) = tokio::join!(
        second.sign("ec", SignAlgorithm::EcdsaSha256, request("x", &[])),
        second.sign("ec", SignAlgorithm::EcdsaSha256, request("y", &[])),
    );

    assert_eq!(a1.unwrap(), a2.unwrap());
    assert_eq!(b1.unwrap(), b2.unwrap());
}

#[tokio::test]
async fn key_algorithm_mismatch_is_a_token_failure() {
    let signer = signer();

    let error = signer
        .sign("ec", SignAlgorithm::RsaSha256, request("rsa?", &[]))
        .await
        .unwrap_err();

    assert!(matches!(error, batch_signer::SignerError::Signing(_)));
    assert_eq!(error.code(), "signing_failed");
    assert!(error.to_string().contains("cannot sign with"));
}
