//! Encrypts a short message with CFB-128, prints the trace, and decrypts it back.

use aes_cfb::{Cfb128, HexWriter};

fn main() {
    // Fixed key and IV keep the output reproducible.
    let key: [u8; 16] = core::array::from_fn(|i| i as u8);
    let iv = [0x24u8; 16];
    let cfb = Cfb128::new(&key, &iv).expect("16-byte key and IV");

    let message = b"twenty byte message!";
    let mut trace = HexWriter::new(std::io::stdout().lock());
    let ciphertext = cfb.encrypt_traced(message, &mut trace);
    drop(trace);

    let recovered = cfb.decrypt(&ciphertext);
    assert_eq!(recovered, message);

    println!();
    println!("ciphertext: {}", hex::encode(&ciphertext));
    println!("example succeeded; decryption restored the message");
}
