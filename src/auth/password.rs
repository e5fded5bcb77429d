use bcrypt::BcryptError;

/// Hash a plaintext password for storage. The work factor comes from config
/// so non-production environments can use a cheap cost.
pub fn hash_password(plain: &str, cost: u32) -> Result<String, BcryptError> {
    bcrypt::hash(plain, cost)
}

/// Check a plaintext password against a stored bcrypt hash.
pub fn verify_password(plain: &str, hashed: &str) -> Result<bool, BcryptError> {
    bcrypt::verify(plain, hashed)
}
