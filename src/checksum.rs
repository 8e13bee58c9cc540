/// Calcula o checksum da Internet (RFC 1071).
///
/// Soma palavras de 16 bits big-endian; um byte final ímpar vale como byte
/// alto de uma palavra completada com zero. O resultado, escrito em
/// big-endian no campo de checksum, faz o pacote inteiro somar zero.
pub fn compute(mut data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    while data.len() >= 2 {
        sum = sum.wrapping_add(u16::from_be_bytes([data[0], data[1]]) as u32);
        data = &data[2..];
    }
    if !data.is_empty() {
        sum = sum.wrapping_add((data[0] as u32) << 8);
    }
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}
