use chrono::{SubsecRound, Utc};
use num_bigint::ModInverse;
use pgp_cleartext::composed::{CertifyParamsBuilder, SignedSecretKey};
use pgp_cleartext::crypto::ecc_curve::ECCCurve;
use pgp_cleartext::crypto::hash::HashAlgorithm;
use pgp_cleartext::crypto::public_key::PublicKeyAlgorithm;
use pgp_cleartext::packet::{PublicKey, SecretKey, UserId};
use pgp_cleartext::types::{KeyDetails, Mpi, PlainSecretParams, PublicParams, SecretParams};
use pgp_cleartext::{CleartextMessage, Config, ConfigBuilder, Error, SignedPublicKey, Validity};
use pretty_assertions::assert_eq;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};

const ALICE: &str = include_str!("fixtures/alice.pub.asc");
const BOB: &str = include_str!("fixtures/bob.pub.asc");
const ALICE_BOB_SIGNED: &str = include_str!("fixtures/alice-bob.sig.asc");
const ALICE_SHA512_SIGNED: &str = include_str!("fixtures/alice-sha512.sig.asc");
const MSG: &str = include_str!("fixtures/msg.txt");

fn secret_key(
    alg: PublicKeyAlgorithm,
    public: PublicParams,
    secret: PlainSecretParams,
    name: &str,
) -> SignedSecretKey {
    let created = Utc::now().trunc_subsecs(0);
    let details = PublicKey::new(alg, created, public).unwrap();
    let primary = SecretKey::new(details, SecretParams::Plain(secret));

    SignedSecretKey::self_certify(
        primary,
        vec![UserId::from_str(name)],
        vec![],
        &CertifyParamsBuilder::default()
            .created_at(created)
            .build()
            .unwrap(),
    )
    .unwrap()
}

fn ed25519_key(rng: &mut ChaCha8Rng, name: &str) -> SignedSecretKey {
    let mut seed = [0u8; 32];
    rng.fill_bytes(&mut seed);
    let key = ed25519_dalek::SigningKey::from_bytes(&seed);

    let mut q = vec![0x40];
    q.extend_from_slice(key.verifying_key().as_bytes());

    secret_key(
        PublicKeyAlgorithm::EdDSA,
        PublicParams::EdDSA {
            curve: ECCCurve::Ed25519,
            q: Mpi::from_slice(&q),
        },
        PlainSecretParams::EdDSA {
            x: Mpi::from_slice(&seed),
        },
        name,
    )
}

fn rsa_key(rng: &mut ChaCha8Rng, bits: usize, name: &str) -> SignedSecretKey {
    let key = rsa::RsaPrivateKey::new(rng, bits).unwrap();
    let p = &key.primes()[0];
    let q = &key.primes()[1];
    let u = p.clone().mod_inverse(q).unwrap().to_biguint().unwrap();

    secret_key(
        PublicKeyAlgorithm::RSA,
        PublicParams::RSA {
            n: key.n().into(),
            e: key.e().into(),
        },
        PlainSecretParams::RSA {
            d: key.d().into(),
            p: p.into(),
            q: q.into(),
            u: u.into(),
        },
        name,
    )
}

#[test]
fn verify_gnupg_signatures() {
    let _ = pretty_env_logger::try_init();

    let alice = SignedPublicKey::from_armor(ALICE).unwrap();
    let bob = SignedPublicKey::from_armor(BOB).unwrap();
    assert_eq!(
        alice.primary_user().unwrap().id,
        UserId::from_str("Alice <alice@example.org>")
    );

    let msg = CleartextMessage::from_armor(ALICE_BOB_SIGNED).unwrap();
    assert_eq!(
        msg.text(),
        "Hello from the fixtures.\n- this line starts with a dash\nFrom here on\ntrailing whitespace is not signed."
    );
    assert_eq!(msg.signing_key_ids(), vec![alice.key_id(), bob.key_id()]);
    assert_eq!(msg.hash_algorithms(), vec![HashAlgorithm::Sha256]);

    let res = msg.verify(&[bob.clone(), alice.clone()], &Config::default()).unwrap();
    assert_eq!(res.len(), 2);
    assert_eq!(res[0].key_id, Some(alice.key_id()));
    assert_eq!(res[0].validity, Validity::Valid);
    assert_eq!(res[1].key_id, Some(bob.key_id()));
    assert_eq!(res[1].validity, Validity::Valid);

    // only one of the signers known
    let res = msg.verify(&[bob.clone()], &Config::default()).unwrap();
    assert_eq!(
        res.iter().map(|r| r.validity).collect::<Vec<_>>(),
        vec![Validity::Unknown, Validity::Valid]
    );

    let msg = CleartextMessage::from_armor(ALICE_SHA512_SIGNED).unwrap();
    assert_eq!(msg.hash_algorithms(), vec![HashAlgorithm::Sha512]);
    let res = msg.verify(&[alice], &Config::default()).unwrap();
    assert!(res[0].is_valid());
}

#[test]
fn tampered_gnupg_message() {
    let alice = SignedPublicKey::from_armor(ALICE).unwrap();
    let bob = SignedPublicKey::from_armor(BOB).unwrap();

    let tampered = ALICE_BOB_SIGNED.replace("Hello from", "Hello frim");
    let msg = CleartextMessage::from_armor(&tampered).unwrap();
    let res = msg.verify(&[alice, bob], &Config::default()).unwrap();
    assert!(res.iter().all(|r| r.validity == Validity::Invalid));

    // trailing whitespace and line endings are not part of the signed text
    let reformatted = ALICE_BOB_SIGNED
        .replace("signed.\n-----BEGIN", "signed.\r\n-----BEGIN")
        .replace("fixtures.\n", "fixtures.\t\r\n");
    let msg = CleartextMessage::from_armor(&reformatted).unwrap();
    let res = msg
        .verify(&[SignedPublicKey::from_armor(ALICE).unwrap()], &Config::default())
        .unwrap();
    assert_eq!(res[0].validity, Validity::Valid);
}

#[test]
fn sign_with_several_keys() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let keys = vec![
        ed25519_key(&mut rng, "one"),
        rsa_key(&mut rng, 2048, "two"),
        ed25519_key(&mut rng, "three"),
    ];
    let public: Vec<_> = keys.iter().map(SignedSecretKey::public_key).collect();

    let msg = CleartextMessage::new(MSG);
    let signed = msg.sign(&keys, &Config::default()).unwrap();
    assert_eq!(
        signed.signing_key_ids(),
        keys.iter().map(|k| k.key_id()).collect::<Vec<_>>()
    );
    assert_eq!(
        signed.signatures().iter().map(|s| s.pub_alg()).collect::<Vec<_>>(),
        vec![
            PublicKeyAlgorithm::EdDSA,
            PublicKeyAlgorithm::RSA,
            PublicKeyAlgorithm::EdDSA
        ]
    );

    let armored = signed.to_armored_string(&Config::default()).unwrap();
    let parsed = CleartextMessage::from_armor(&armored).unwrap();
    assert_eq!(parsed, signed);

    let res = parsed.verify(&public, &Config::default()).unwrap();
    assert!(res.iter().all(|r| r.validity == Validity::Valid));

    // unrelated keys know nothing about these signatures
    let others = vec![ed25519_key(&mut rng, "other").public_key()];
    let res = parsed.verify(&others, &Config::default()).unwrap();
    assert!(res.iter().all(|r| r.validity == Validity::Unknown));

    // signing again keeps the existing signatures
    let resigned = parsed.sign(&keys[..1], &Config::default()).unwrap();
    assert_eq!(resigned.signatures().len(), 4);
    assert_eq!(&resigned.signatures()[..3], signed.signatures());
}

#[test]
fn armor_headers() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let key = ed25519_key(&mut rng, "headers");

    let config = ConfigBuilder::default()
        .prefer_hash_algorithm(HashAlgorithm::Sha384)
        .show_comment(true)
        .comment_string("cleartext test")
        .version_string("test 1.0")
        .build()
        .unwrap();
    let signed = CleartextMessage::new("-----BEGIN\nnot a header\n")
        .sign(&[key.clone()], &config)
        .unwrap();
    let armored = signed.to_armored_string(&config).unwrap();

    let lines: Vec<_> = armored.lines().collect();
    assert_eq!(
        &lines[..6],
        &[
            "-----BEGIN PGP SIGNED MESSAGE-----",
            "Hash: SHA384",
            "",
            "- -----BEGIN",
            "not a header",
            "",
        ]
    );
    assert_eq!(lines[6], "-----BEGIN PGP SIGNATURE-----");
    assert!(lines.contains(&"Version: test 1.0"));
    assert!(lines.contains(&"Comment: cleartext test"));

    let parsed = CleartextMessage::from_armor(&armored).unwrap();
    assert_eq!(parsed.text(), "-----BEGIN\nnot a header\n");
    assert!(parsed.verify(&[key.public_key()], &config).unwrap()[0].is_valid());
}

#[test]
fn hash_header_mismatch() {
    let with_md5 = ALICE_BOB_SIGNED.replace("Hash: SHA256", "Hash: MD5");
    assert!(matches!(
        CleartextMessage::from_armor(&with_md5),
        Err(Error::HeaderMismatch { .. })
    ));

    let without = ALICE_BOB_SIGNED.replace("Hash: SHA256\n", "");
    assert!(matches!(
        CleartextMessage::from_armor(&without),
        Err(Error::HeaderMismatch { .. })
    ));

    let extended = ALICE_BOB_SIGNED.replace("Hash: SHA256", "Hash: SHA1, SHA256, NOT-A-HASH");
    assert!(CleartextMessage::from_armor(&extended).is_ok());
}

#[test]
fn public_key_armor_roundtrip() {
    let alice = SignedPublicKey::from_armor(ALICE).unwrap();
    let armored = alice
        .to_armored_string(&ConfigBuilder::default().show_version(false).build().unwrap())
        .unwrap();
    assert_eq!(SignedPublicKey::from_armor(&armored).unwrap(), alice);

    let signing = alice.signing_key(None, false).unwrap().unwrap();
    assert!(signing.is_primary());

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let secret = ed25519_key(&mut rng, "roundtrip");
    let armored = secret.to_armored_string(&Config::default()).unwrap();
    assert_eq!(SignedSecretKey::from_armor(&armored).unwrap(), secret);
}
