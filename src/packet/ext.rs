//
// SPDX-License-Identifier: MIT
//

// Small local replacements for the buffer/address helper traits the wire
// codec leans on. Kept narrow: only the operations the codec actually
// calls.

use std::cell::RefCell;
use std::net::{Ipv4Addr, Ipv6Addr};

use bytes::{Buf, BufMut, BytesMut};
use ipnetwork::{Ipv4Network, Ipv6Network};

thread_local! {
    // Scratch encode buffer reused across `Message::encode` calls on the
    // same thread, avoiding a fresh heap allocation per message.
    pub static TLS_BUF: RefCell<BytesMut> = RefCell::new(BytesMut::with_capacity(4096));
}

pub trait BytesExt: Buf {
    fn get_ipv4(&mut self) -> Ipv4Addr {
        Ipv4Addr::from(self.get_u32())
    }

    fn get_ipv6(&mut self) -> Ipv6Addr {
        Ipv6Addr::from(self.get_u128())
    }

    fn get_u24(&mut self) -> u32 {
        let hi = self.get_u8() as u32;
        let lo = self.get_u16() as u32;
        (hi << 16) | lo
    }
}

impl<T: Buf + ?Sized> BytesExt for T {}

pub trait BytesMutExt: BufMut {
    fn put_ipv4(&mut self, addr: &Ipv4Addr) {
        self.put_slice(&addr.octets());
    }

    fn put_ipv6(&mut self, addr: &Ipv6Addr) {
        self.put_slice(&addr.octets());
    }

    fn put_u24(&mut self, value: u32) {
        self.put_u8((value >> 16) as u8);
        self.put_u16(value as u16);
    }
}

impl<T: BufMut + ?Sized> BytesMutExt for T {}

pub trait Ipv4AddrExt {
    const LENGTH: usize;
}

impl Ipv4AddrExt for Ipv4Addr {
    const LENGTH: usize = 4;
}

pub trait Ipv6AddrExt {
    const LENGTH: usize;
}

impl Ipv6AddrExt for Ipv6Addr {
    const LENGTH: usize = 16;
}

pub trait Ipv4NetworkExt {
    fn apply_mask(&self) -> Self;
    fn is_routable(&self) -> bool;
}

impl Ipv4NetworkExt for Ipv4Network {
    fn apply_mask(&self) -> Self {
        let masked = u32::from(self.ip()) & u32::from(self.mask());
        Ipv4Network::new(Ipv4Addr::from(masked), self.prefix()).unwrap()
    }

    fn is_routable(&self) -> bool {
        let ip = self.ip();
        !(ip.is_unspecified() || ip.is_loopback() || ip.is_multicast() || ip.is_broadcast())
    }
}

pub trait Ipv6NetworkExt {
    fn apply_mask(&self) -> Self;
    fn is_routable(&self) -> bool;
}

impl Ipv6NetworkExt for Ipv6Network {
    fn apply_mask(&self) -> Self {
        let masked = u128::from(self.ip()) & u128::from(self.mask());
        Ipv6Network::new(Ipv6Addr::from(masked), self.prefix()).unwrap()
    }

    fn is_routable(&self) -> bool {
        let ip = self.ip();
        !(ip.is_unspecified() || ip.is_loopback() || ip.is_multicast())
    }
}
