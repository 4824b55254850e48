use uuid::Uuid;

// uuid v7 keeps ids time ordered, bs58 keeps them short and url safe
pub fn random_id() -> String {
    bs58::encode(Uuid::now_v7().as_bytes()).into_string()
}
